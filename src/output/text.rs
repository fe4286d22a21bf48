use crate::session::ConversionBlock;

/// Header line placed above each SIEM's query.
pub fn header(siem: &str) -> String {
    format!("# --- {} ---", siem.to_uppercase())
}

/// Render queries separated by blank lines, optionally with a header each.
pub fn render(blocks: &[ConversionBlock], headers: bool) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(blocks.len() * 3);
    for block in blocks {
        if headers {
            lines.push(header(&block.siem));
        }
        lines.push(block.query.clone());
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}
