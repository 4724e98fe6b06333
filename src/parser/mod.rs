pub mod links;
pub mod rows;
pub mod section;
pub mod table;

use anyhow::{bail, Result};
use tracing::info;

use rows::NormalizedRow;

/// Full parse pipeline: locate the target section, pull the first table
/// out of it (whatever the encoding), and normalize every row. An empty
/// result means "nothing to process", not an error; a missing section is
/// a hard failure.
pub fn parse_document(document: &str, keywords: &[&str]) -> Result<Vec<NormalizedRow>> {
    let Some(section) = section::locate(document, keywords) else {
        bail!("no section heading matched any of {:?}", keywords);
    };
    info!("Section located ({} lines)", section.lines().count());

    let Some((kind, raw_rows)) = table::extract_rows(&section, document) else {
        info!("No table found in section or document");
        return Ok(Vec::new());
    };
    info!("Found {} ({} rows)", kind.describe(), raw_rows.len());

    Ok(raw_rows.iter().map(rows::normalize).collect())
}

// ── Tests ──
