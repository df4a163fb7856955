//! Page façades
//!
//! Task-level operations over the engine. Every method degrades to a
//! boolean, an empty result or `PageError`; tree-walk failures stay inside.

pub mod cart;
pub mod login;
pub mod products;
pub mod sample;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cart::CartPage;
pub use login::{LoginOutcome, LoginPage};
pub use products::{ProductsPage, SortTier};
pub use sample::SamplePage;

/// The only error that crosses the façade boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("{page} page controls not found: {}", .controls.join(", "))]
    FatalControlMissing {
        page: &'static str,
        controls: Vec<&'static str>,
    },
}

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// Quote a string as an XPath literal
fn xpath_literal(s: &str) -> String {
    if s.contains('\'') {
        format!("\"{}\"", s.replace('"', ""))
    } else {
        format!("'{}'", s)
    }
}

/// Quote a string as an NSPredicate literal
fn predicate_literal(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `//tag[contains(lower(@a), needle) or ...]` with a case-folded needle
fn lower_contains_xpath(tag: &str, attrs: &[&str], needle: &str) -> String {
    let needle = xpath_literal(&needle.to_lowercase());
    let clauses: Vec<String> = attrs
        .iter()
        .map(|attr| {
            format!(
                "contains(translate(@{}, '{}', '{}'), {})",
                attr, UPPER, LOWER, needle
            )
        })
        .collect();
    format!("//{}[{}]", tag, clauses.join(" or "))
}
