//! Page-source model
//!
//! Parses the XML page source served by XCUITest (`XCUIElementType*` nodes
//! with `x/y/width/height`) or UiAutomator2 (`node`/class-named nodes with
//! `bounds="[l,t][r,b]"`) into a flat arena that keeps parent/child links in
//! document order.

use super::traits::{NodeText, Rect};
use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::sync::OnceLock;

/// Decode common HTML entities in a string
/// Handles: &amp; &lt; &gt; &quot; &apos; &#NNN; (decimal) &#xHHH; (hex)
fn decode_html_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    let numeric = NUMERIC
        .get_or_init(|| Regex::new(r"&#(x[0-9A-Fa-f]+|\d+);").expect("static regex"));

    let decoded = numeric.replace_all(s, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    // &amp; last so "&amp;lt;" stays "&lt;"
    decoded
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Parse bounds from string like "[0,0][1080,1920]"
fn rect_from_bounds(s: &str) -> Option<Rect> {
    let (left_top, right_bottom) = s.split_once("][")?;
    let lt: Vec<f64> = left_top
        .trim_start_matches('[')
        .split(',')
        .filter_map(|v| v.trim().parse().ok())
        .collect();
    let rb: Vec<f64> = right_bottom
        .trim_end_matches(']')
        .split(',')
        .filter_map(|v| v.trim().parse().ok())
        .collect();

    if lt.len() == 2 && rb.len() == 2 {
        Some(Rect {
            x: lt[0],
            y: lt[1],
            width: rb[0] - lt[0],
            height: rb[1] - lt[1],
        })
    } else {
        None
    }
}

/// A node of the UI hierarchy
#[derive(Debug, Clone)]
pub struct UiNode {
    /// XML tag (element type on iOS, class or `node` on Android)
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl UiNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn first_attr(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|n| self.attr(n))
            .find(|v| !v.is_empty())
    }

    /// Element type: `type` (iOS), `class` (Android) or the tag itself
    pub fn element_type(&self) -> &str {
        self.first_attr(&["type", "class"]).unwrap_or(&self.tag)
    }

    /// Accessibility identifier as the protocol's `accessibility id` sees it
    pub fn accessibility_id(&self) -> Option<&str> {
        self.first_attr(&["name", "content-desc", "accessibilityIdentifier"])
    }

    pub fn name(&self) -> Option<&str> {
        self.first_attr(&["name", "content-desc"])
    }

    pub fn label(&self) -> Option<&str> {
        self.first_attr(&["label", "content-desc"])
    }

    pub fn text(&self) -> Option<&str> {
        self.first_attr(&["text"])
    }

    pub fn value(&self) -> Option<&str> {
        self.first_attr(&["value"])
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.first_attr(&["resource-id", "identifier"])
    }

    /// Attribute lookup with the aliases predicate/XPath expressions rely on
    pub fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "type" | "elementType" | "class" | "className" => Some(self.element_type()),
            "label" => self.label(),
            "name" | "identifier" => self.name(),
            "content-desc" | "contentDescription" | "description" => {
                self.first_attr(&["content-desc", "label"])
            }
            "resource-id" | "resourceId" => self.resource_id(),
            other => self.attr(other),
        }
    }

    pub fn node_text(&self) -> NodeText {
        NodeText {
            text: self.text().map(str::to_string),
            label: self.label().map(str::to_string),
            value: self.value().map(str::to_string),
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        if let Some(b) = self.attr("bounds") {
            return rect_from_bounds(b);
        }
        let num = |k: &str| self.attr(k).and_then(|v| v.parse::<f64>().ok());
        Some(Rect {
            x: num("x")?,
            y: num("y")?,
            width: num("width")?,
            height: num("height")?,
        })
    }
}

/// Parsed page source
#[derive(Debug, Clone, Default)]
pub struct PageSource {
    pub nodes: Vec<UiNode>,
}

impl PageSource {
    /// Parse page-source XML
    pub fn parse(xml: &str) -> Result<Self> {
        let mut nodes: Vec<UiNode> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .with_context(|| format!("Malformed page source at byte {}", reader.buffer_position()))?;

            match event {
                Event::Start(ref e) => {
                    let idx = Self::push_node(&mut nodes, e, stack.last().copied());
                    stack.push(idx);
                }
                Event::Empty(ref e) => {
                    Self::push_node(&mut nodes, e, stack.last().copied());
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { nodes })
    }

    fn push_node(nodes: &mut Vec<UiNode>, e: &BytesStart, parent: Option<usize>) -> usize {
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let attrs = e
            .attributes()
            .filter_map(|a| a.ok())
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                let value = decode_html_entities(&String::from_utf8_lossy(&attr.value));
                (key, value)
            })
            .collect();

        let idx = nodes.len();
        nodes.push(UiNode {
            tag,
            attrs,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            nodes[p].children.push(idx);
        }
        idx
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> Option<&UiNode> {
        self.nodes.get(idx)
    }

    /// Descendants of `idx` in document order (excluding `idx`)
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = match self.nodes.get(idx) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(self.nodes[i].children.iter().rev().copied());
        }
        out
    }

    /// Ancestors of `idx`, nearest first
    pub fn ancestors(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cur = self.nodes.get(idx).and_then(|n| n.parent);
        while let Some(p) = cur {
            out.push(p);
            cur = self.nodes[p].parent;
        }
        out
    }

    /// Whether `idx` lies inside the subtree rooted at `root`
    pub fn is_within(&self, idx: usize, root: usize) -> bool {
        self.ancestors(idx).contains(&root)
    }

    /// Unique locator hints (type, accessibility id, label, value), in document order
    pub fn locator_hints(&self) -> Vec<LocatorHint> {
        let mut hints: Vec<LocatorHint> = Vec::new();
        for node in &self.nodes {
            let hint = LocatorHint {
                element_type: node.element_type().to_string(),
                accessibility_id: node.accessibility_id().map(str::to_string),
                label: node.label().map(str::to_string),
                value: node.value().or(node.text()).map(str::to_string),
            };
            if hint.accessibility_id.is_none() && hint.label.is_none() && hint.value.is_none() {
                continue;
            }
            if !hints.contains(&hint) {
                hints.push(hint);
            }
        }
        hints
    }
}

/// A candidate locator discovered in a page source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorHint {
    pub element_type: String,
    pub accessibility_id: Option<String>,
    pub label: Option<String>,
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const IOS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" label="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item" x="0" y="100" width="195" height="300">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Item title" label="Sauce Labs Backpack" x="10" y="300" width="150" height="20"/>
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Price" label="$29.99" x="10" y="330" width="60" height="20"/>
    </XCUIElementTypeOther>
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Devices &amp; Groups&#10;2 on" x="0" y="0" width="1" height="1"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(decode_html_entities("Devices &amp; Groups"), "Devices & Groups");
        assert_eq!(decode_html_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_html_entities("Security&#10;Safe"), "Security\nSafe");
        assert_eq!(decode_html_entities("&#x41;&#x42;"), "AB");
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_html_entities("Normal text"), "Normal text");
    }

    #[test]
    fn test_parse_tree_links() {
        let src = PageSource::parse(IOS_XML).unwrap();
        // AppiumAUT, Application, Other, 2x StaticText, StaticText
        assert_eq!(src.len(), 6);
        assert_eq!(src.nodes[2].tag, "XCUIElementTypeOther");
        assert_eq!(src.nodes[2].children, vec![3, 4]);
        assert_eq!(src.ancestors(3), vec![2, 1, 0]);
        assert_eq!(src.descendants(1), vec![2, 3, 4, 5]);
        assert!(src.is_within(4, 2));
        assert!(!src.is_within(5, 2));
    }

    #[test]
    fn test_node_attributes() {
        let src = PageSource::parse(IOS_XML).unwrap();
        let title = &src.nodes[3];
        assert_eq!(title.accessibility_id(), Some("test-Item title"));
        assert_eq!(title.label(), Some("Sauce Labs Backpack"));
        assert_eq!(title.element_type(), "XCUIElementTypeStaticText");
        let rect = title.rect().unwrap();
        assert_eq!(rect.center(), (85, 310));
        assert_eq!(src.nodes[5].label(), Some("Devices & Groups\n2 on"));
    }

    #[test]
    fn test_android_bounds() {
        let xml = r#"<hierarchy><node class="android.widget.TextView" text="PRODUCTS" content-desc="" resource-id="com.swaglabs:id/title" bounds="[0,100][1080,200]"/></hierarchy>"#;
        let src = PageSource::parse(xml).unwrap();
        let node = &src.nodes[1];
        assert_eq!(node.element_type(), "android.widget.TextView");
        assert_eq!(node.text(), Some("PRODUCTS"));
        assert_eq!(node.accessibility_id(), None);
        assert_eq!(node.rect().unwrap().center(), (540, 150));
    }

    #[test]
    fn test_locator_hints_are_unique() {
        let src = PageSource::parse(IOS_XML).unwrap();
        let hints = src.locator_hints();
        assert!(hints
            .iter()
            .any(|h| h.accessibility_id.as_deref() == Some("test-Item")));
        // Application node carries name+label "Swag Labs" once
        assert_eq!(
            hints
                .iter()
                .filter(|h| h.label.as_deref() == Some("Swag Labs"))
                .count(),
            1
        );
        // AppiumAUT wrapper has nothing to offer
        assert!(!hints.iter().any(|h| h.element_type == "AppiumAUT"));
    }
}
