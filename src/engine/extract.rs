//! Text/value extraction and classification

use crate::driver::traits::{AutomationSession, ControlHandle, NodeText};
use crate::utils::config::ErrorHeuristics;
use regex::Regex;
use std::sync::OnceLock;

/// First non-empty of text, label, value (trimmed), else `""`
pub fn normalize(node: &NodeText) -> String {
    [&node.text, &node.label, &node.value]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

pub fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
}

/// Keyword hit, or a short exclamation
pub fn is_error_like(text: &str, heuristics: &ErrorHeuristics) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    contains_keyword(text, &heuristics.keywords)
        || (text.chars().count() < heuristics.short_text_threshold && text.contains('!'))
}

/// `"$1,299.99"` -> `1299.99`; `None` when there is no number
pub fn extract_price(text: &str) -> Option<f64> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("static regex"));

    let cleaned = text.replace(',', "");
    number
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Drop empty strings and exact duplicates, keeping first-seen order
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Normalized text of one node; read errors give `""`
pub async fn text_of(session: &dyn AutomationSession, handle: &ControlHandle) -> String {
    match session.node_text(handle).await {
        Ok(node) => normalize(&node),
        Err(e) => {
            log::debug!("text read failed on {}: {}", handle, e);
            String::new()
        }
    }
}

/// Normalized texts of many nodes, skipping unreadable and empty ones
pub async fn texts_of(session: &dyn AutomationSession, handles: &[ControlHandle]) -> Vec<String> {
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        let text = text_of(session, handle).await;
        if !text.is_empty() {
            out.push(text);
        }
    }
    out
}
