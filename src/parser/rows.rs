use scraper::Html;

/// Ordered header → cell mapping produced by either table parser.
/// The column set is only known at parse time, so rows are dynamic
/// records rather than a fixed struct.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push((header.into(), value.into()));
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Both renditions of one cell: markup stripped, and as found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub raw: String,
}

/// Uniform row shape regardless of which parser produced it: every column
/// carries a stripped-text variant and a raw-markup variant.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRow {
    cells: Vec<(String, Cell)>,
}

impl NormalizedRow {
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn cell(&self, header: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, c)| c)
    }

    /// Plain-text variant of a column, empty when the column is absent.
    pub fn text(&self, header: &str) -> &str {
        self.cell(header).map(|c| c.text.as_str()).unwrap_or("")
    }

    /// Raw-markup variant of a column, empty when the column is absent.
    pub fn raw(&self, header: &str) -> &str {
        self.cell(header).map(|c| c.raw.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Enrich a raw row with both variants per column. Stripping is a no-op
/// for cells that never contained markup.
pub fn normalize(row: &RawRow) -> NormalizedRow {
    let mut cells = Vec::with_capacity(row.len());
    for (header, value) in row.iter() {
        cells.push((
            header.to_string(),
            Cell {
                text: strip_tags(value),
                raw: value.to_string(),
            },
        ));
    }
    NormalizedRow { cells }
}

/// Flatten markup to text: drop tags, decode entities, collapse whitespace.
/// Tolerant of malformed tags; the source document is third-party markup.
pub fn strip_tags(value: &str) -> String {
    if !value.contains('<') && !value.contains('&') {
        return collapse_ws(value);
    }
    let fragment = Html::parse_fragment(value);
    collapse_ws(&fragment.root_element().text().collect::<String>())
}

pub(crate) fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──
