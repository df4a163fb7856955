//! Locator evaluation over a page-source snapshot

use super::predicate::Predicate;
use super::source::{PageSource, UiNode};
use super::traits::{ProbeError, Strategy};
use super::xpath::XPath;
use regex::Regex;
use std::sync::OnceLock;

/// Evaluate a locator against `src`.
///
/// Returns matching node indices in document order. With `scope`, only nodes
/// inside that subtree are returned; XPath expressions are evaluated with the
/// scope node as context instead.
pub fn select(
    src: &PageSource,
    strategy: Strategy,
    expression: &str,
    scope: Option<usize>,
) -> Result<Vec<usize>, ProbeError> {
    let invalid = |reason: String| ProbeError::InvalidSelector {
        strategy,
        expression: expression.to_string(),
        reason,
    };

    if expression.trim().is_empty() {
        return Err(invalid("empty expression".into()));
    }

    let matcher: Box<dyn Fn(&UiNode) -> bool + '_> = match strategy {
        Strategy::AccessibilityId => {
            Box::new(move |n: &UiNode| n.accessibility_id() == Some(expression))
        }
        Strategy::Id => Box::new(move |n: &UiNode| {
            n.resource_id()
                .map(|rid| rid == expression || rid.ends_with(&format!("/{}", expression)))
                .unwrap_or(false)
                || n.name() == Some(expression)
        }),
        Strategy::Name => Box::new(move |n: &UiNode| n.name() == Some(expression)),
        Strategy::ClassName => Box::new(move |n: &UiNode| n.element_type() == expression),
        Strategy::IosPredicate => {
            let predicate = Predicate::parse(expression).map_err(invalid)?;
            Box::new(move |n: &UiNode| predicate.matches(n))
        }
        Strategy::AndroidUiAutomator => {
            let selector = UiSelector::parse(expression).map_err(invalid)?;
            return Ok(selector.select(src, scope));
        }
        Strategy::XPath => {
            let xpath = XPath::parse(expression).map_err(invalid)?;
            return Ok(xpath.select_from(src, scope));
        }
    };

    Ok(candidates(src, scope)
        .into_iter()
        .filter(|&i| matcher(&src.nodes[i]))
        .collect())
}

fn candidates(src: &PageSource, scope: Option<usize>) -> Vec<usize> {
    match scope {
        Some(root) => src.descendants(root),
        None => (0..src.len()).collect(),
    }
}

#[derive(Debug, Clone)]
enum SelectorCond {
    Description(String),
    DescriptionContains(String),
    DescriptionStartsWith(String),
    DescriptionMatches(Regex),
    Text(String),
    TextContains(String),
    TextStartsWith(String),
    TextMatches(Regex),
    ClassName(String),
    ResourceId(String),
    ResourceIdMatches(Regex),
    Flag(String, bool),
}

/// `new UiSelector().textContains("x").className("y")` chains
#[derive(Debug, Clone)]
pub struct UiSelector {
    conds: Vec<SelectorCond>,
    instance: Option<usize>,
}

fn method_regex() -> &'static Regex {
    static METHOD: OnceLock<Regex> = OnceLock::new();
    METHOD.get_or_init(|| {
        Regex::new(r#"\s*\.\s*(\w+)\(\s*(?:"((?:[^"\\]|\\.)*)"|(\d+)|(true|false))?\s*\)\s*;?"#)
            .expect("static regex")
    })
}

impl UiSelector {
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix("new UiSelector()")
            .unwrap_or(trimmed);

        let mut conds = Vec::new();
        let mut instance = None;
        let mut consumed = 0;

        for caps in method_regex().captures_iter(body) {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
            if whole.0 != consumed {
                return Err(format!("unexpected input at offset {}", consumed));
            }
            consumed = whole.1;

            let method = &caps[1];
            let string_arg = caps.get(2).map(|m| m.as_str().replace("\\\"", "\""));
            let num_arg = caps.get(3).and_then(|m| m.as_str().parse::<usize>().ok());
            let bool_arg = caps.get(4).map(|m| m.as_str() == "true");

            let need_str = || {
                string_arg
                    .clone()
                    .ok_or_else(|| format!("{}() expects a string", method))
            };
            let need_regex = || {
                need_str().and_then(|s| Regex::new(&format!("^(?:{})$", s)).map_err(|e| e.to_string()))
            };

            let cond = match method {
                "description" => SelectorCond::Description(need_str()?),
                "descriptionContains" => SelectorCond::DescriptionContains(need_str()?),
                "descriptionStartsWith" => SelectorCond::DescriptionStartsWith(need_str()?),
                "descriptionMatches" => SelectorCond::DescriptionMatches(need_regex()?),
                "text" => SelectorCond::Text(need_str()?),
                "textContains" => SelectorCond::TextContains(need_str()?),
                "textStartsWith" => SelectorCond::TextStartsWith(need_str()?),
                "textMatches" => SelectorCond::TextMatches(need_regex()?),
                "className" => SelectorCond::ClassName(need_str()?),
                "resourceId" => SelectorCond::ResourceId(need_str()?),
                "resourceIdMatches" => SelectorCond::ResourceIdMatches(need_regex()?),
                "clickable" | "enabled" | "checked" | "selected" | "focused" | "scrollable" => {
                    SelectorCond::Flag(method.to_string(), bool_arg.unwrap_or(true))
                }
                "instance" => {
                    instance = Some(num_arg.ok_or("instance() expects a number")?);
                    continue;
                }
                other => return Err(format!("unsupported UiSelector method '{}'", other)),
            };
            conds.push(cond);
        }

        if consumed != body.len() {
            return Err(format!("unexpected input at offset {}", consumed));
        }
        if conds.is_empty() && instance.is_none() {
            return Err("empty UiSelector".into());
        }

        Ok(Self { conds, instance })
    }

    fn matches(&self, node: &UiNode) -> bool {
        let desc = node.lookup("content-desc").unwrap_or("");
        let text = node.text().unwrap_or("");
        self.conds.iter().all(|c| match c {
            SelectorCond::Description(s) => desc == s,
            SelectorCond::DescriptionContains(s) => desc.contains(s.as_str()),
            SelectorCond::DescriptionStartsWith(s) => desc.starts_with(s.as_str()),
            SelectorCond::DescriptionMatches(re) => re.is_match(desc),
            SelectorCond::Text(s) => text == s,
            SelectorCond::TextContains(s) => text.contains(s.as_str()),
            SelectorCond::TextStartsWith(s) => text.starts_with(s.as_str()),
            SelectorCond::TextMatches(re) => re.is_match(text),
            SelectorCond::ClassName(s) => node.element_type() == s,
            SelectorCond::ResourceId(s) => node.resource_id() == Some(s.as_str()),
            SelectorCond::ResourceIdMatches(re) => re.is_match(node.resource_id().unwrap_or("")),
            SelectorCond::Flag(name, expected) => {
                node.attr(name).map(|v| v == "true") == Some(*expected)
            }
        })
    }

    pub fn select(&self, src: &PageSource, scope: Option<usize>) -> Vec<usize> {
        let hits: Vec<usize> = candidates(src, scope)
            .into_iter()
            .filter(|&i| self.matches(&src.nodes[i]))
            .collect();
        match self.instance {
            Some(n) => hits.get(n).copied().into_iter().collect(),
            None => hits,
        }
    }
}
