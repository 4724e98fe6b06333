use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::rows::{collapse_ws, RawRow};

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-+\s*(\|\s*-+\s*)*$").unwrap());
static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static TR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());

/// Where the row data came from, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Pipe,
    SectionHtml,
    DocumentHtml,
}

impl TableKind {
    pub fn describe(self) -> &'static str {
        match self {
            TableKind::Pipe => "markdown pipe table",
            TableKind::SectionHtml => "HTML table in section",
            TableKind::DocumentHtml => "HTML table in document",
        }
    }
}

/// Format cascade, first hit wins: pipe table in the section, HTML table
/// in the section, HTML table anywhere in the document. The global
/// fallback is deliberately loose; the section's formatting is unreliable.
pub fn extract_rows(section: &str, document: &str) -> Option<(TableKind, Vec<RawRow>)> {
    if let Some(lines) = pipe_table_lines(section) {
        return Some((TableKind::Pipe, parse_pipe_table(&lines)));
    }
    if let Some(rows) = parse_html_table(section).filter(|rows| !rows.is_empty()) {
        return Some((TableKind::SectionHtml, rows));
    }
    if let Some(rows) = parse_html_table(document).filter(|rows| !rows.is_empty()) {
        return Some((TableKind::DocumentHtml, rows));
    }
    None
}

/// Contiguous run of lines whose trimmed content starts with a pipe.
/// The run ends at the first non-pipe line; tables are not resumed after
/// an interruption.
fn pipe_table_lines(section: &str) -> Option<Vec<String>> {
    let mut lines = Vec::new();
    let mut in_table = false;
    for line in section.lines() {
        if line.trim_start().starts_with('|') {
            in_table = true;
            lines.push(line.trim_end().to_string());
        } else if in_table {
            break;
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

/// Positional pipe-table parse: first non-blank line is the header, an
/// optional dashes-only separator is consumed, short rows are padded.
pub fn parse_pipe_table(lines: &[String]) -> Vec<RawRow> {
    let cleaned: Vec<String> = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim().trim_matches('|').trim().to_string())
        .collect();
    if cleaned.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = cleaned[0].split('|').map(|h| h.trim().to_string()).collect();
    let data_start = if SEPARATOR_RE.is_match(&cleaned[1]) { 2 } else { 1 };

    let mut rows = Vec::new();
    for line in &cleaned[data_start..] {
        let mut cells: Vec<String> = line.split('|').map(|c| c.trim().to_string()).collect();
        while cells.len() < headers.len() {
            cells.push(String::new());
        }
        let mut row = RawRow::default();
        for (header, cell) in headers.iter().zip(cells) {
            row.push(header.clone(), cell);
        }
        rows.push(row);
    }
    rows
}

/// Parse the first `<table>` in the markup. Headers come from `<th>`
/// elements when present, else from the first row's cells. Data cells keep
/// their raw outer markup so embedded links survive. Returns None when no
/// table element exists at all.
pub fn parse_html_table(markup: &str) -> Option<Vec<RawRow>> {
    let document = Html::parse_document(markup);
    let table = document.select(&TABLE_SEL).next()?;

    let header_cells: Vec<String> = table.select(&TH_SEL).map(|th| element_text(&th)).collect();
    let trs: Vec<ElementRef> = table.select(&TR_SEL).collect();
    let first_tr_has_th = trs
        .first()
        .map(|tr| tr.select(&TH_SEL).next().is_some())
        .unwrap_or(false);

    // The first row is excluded from data whenever it supplied the headers.
    let (headers, data_start) = if !header_cells.is_empty() {
        (header_cells, usize::from(first_tr_has_th))
    } else {
        let first = trs.first()?;
        let cells: Vec<String> = first.select(&CELL_SEL).map(|c| element_text(&c)).collect();
        (cells, 1)
    };
    if headers.is_empty() {
        return Some(Vec::new());
    }

    let mut rows = Vec::new();
    for tr in &trs[data_start.min(trs.len())..] {
        let cells: Vec<ElementRef> = tr.select(&CELL_SEL).collect();
        if cells.is_empty() {
            continue;
        }
        let mut raw: Vec<String> = cells
            .iter()
            .map(|cell| cell.html().trim().to_string())
            .collect();
        while raw.len() < headers.len() {
            raw.push(String::new());
        }
        let mut row = RawRow::default();
        for (header, cell) in headers.iter().zip(raw) {
            row.push(header.clone(), cell);
        }
        rows.push(row);
    }
    Some(rows)
}

fn element_text(element: &ElementRef) -> String {
    collapse_ws(&element.text().collect::<String>())
}

// ── Tests ──
