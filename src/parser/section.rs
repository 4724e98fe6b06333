/// Locate the section under the first line matching any heading keyword
/// (case-insensitive substring). The section runs from that line to the
/// next `#`-prefixed line (exclusive), or to the end of the document.
/// The earliest matching line wins regardless of keyword order.
pub fn locate(document: &str, keywords: &[&str]) -> Option<String> {
    let lines: Vec<&str> = document.lines().collect();
    let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    let start = lines.iter().position(|line| {
        let line = line.to_lowercase();
        lowered.iter().any(|kw| line.contains(kw.as_str()))
    })?;

    let end = lines[start + 1..]
        .iter()
        .position(|line| line.starts_with('#'))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    Some(lines[start..end].join("\n"))
}

// ── Tests ──
