use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Collects embedded JSON-LD structured data
///
/// Each `<script type="application/ld+json">` block is parsed on its own and
/// malformed blocks are skipped.
///
/// # Returns
///
/// * `None` - No block parsed
/// * `Some(value)` - The single parsed block
/// * `Some(Value::Array)` - Every parsed block, in document order
pub fn extract_json_ld(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script[type]").ok()?;

    let mut blocks: Vec<Value> = document
        .select(&selector)
        .filter(|element| {
            element
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .filter_map(|element| {
            let raw = element.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Skipping malformed JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect();

    match blocks.len() {
        0 => None,
        1 => blocks.pop(),
        _ => Some(Value::Array(blocks)),
    }
}
