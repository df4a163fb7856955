//! Product catalog: listing, add-to-cart and sorting

use super::{lower_contains_xpath, predicate_literal};
use crate::driver::traits::{ControlHandle, LocatorCandidate};
use crate::engine::extract::{dedup_preserving_order, extract_price};
use crate::engine::{Engine, ResolvedControl};
use std::fmt;
use std::time::Duration;

const ROW_WAIT_CAP: Duration = Duration::from_secs(8);

const TITLE_PREDICATE: &str = "type == 'XCUIElementTypeStaticText' AND (label CONTAINS 'Sauce' OR label CONTAINS 'Test.allTheThings')";

fn heading_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_predicate(r#"label == "PRODUCTS""#),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().text("PRODUCTS")"#),
    ]
}

fn row_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_predicate("label CONTAINS 'ADD TO CART' OR label CONTAINS '$'"),
        LocatorCandidate::by_accessibility_id("test-Item"),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().textContains("ADD TO CART")"#),
    ]
}

fn sort_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-Modal Selector Button"),
        LocatorCandidate::by_accessibility_id("test-Sort"),
        LocatorCandidate::by_predicate("label CONTAINS 'Sort' OR label CONTAINS 'Sort By'"),
        LocatorCandidate::by_xpath(lower_contains_xpath(
            "*",
            &["label", "text", "content-desc"],
            "sort",
        )),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().descriptionContains("sort")"#),
    ]
}

fn add_button_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-ADD TO CART"),
        LocatorCandidate::by_predicate("label CONTAINS 'ADD TO CART'"),
    ]
}

/// Which sort tier activated the option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTier {
    /// Exact accessibility id
    Exact,
    /// Case-insensitive label/name/value match
    Content,
    /// Short keyword derived from the label
    Keyword,
}

impl fmt::Display for SortTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortTier::Exact => "exact",
            SortTier::Content => "content",
            SortTier::Keyword => "keyword",
        };
        f.write_str(name)
    }
}

/// Keywords for the last sort tier, most specific first.
///
/// `"Price (low to high)"` gives `["low to high", "price (low"]`. The bare
/// head word is only used when there is no parenthesised part, since it also
/// matches the opposite ordering.
pub fn sort_keywords(label: &str) -> Vec<String> {
    let lower = label.trim().to_lowercase();
    let (head, inner) = match (lower.find('('), lower.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            (lower[..open].trim(), Some(lower[open + 1..close].trim()))
        }
        (Some(open), _) => (lower[..open].trim(), Some(lower[open + 1..].trim())),
        _ => (lower.as_str(), None),
    };
    let head_word = head.split_whitespace().next().unwrap_or("");

    let mut keywords = Vec::new();
    match inner.filter(|s| !s.is_empty()) {
        Some(inner) => {
            keywords.push(inner.to_string());
            if let Some(first) = inner.split_whitespace().next() {
                if !head_word.is_empty() {
                    keywords.push(format!("{} ({}", head_word, first));
                }
            }
        }
        None if !head_word.is_empty() => keywords.push(head_word.to_string()),
        None => {}
    }
    dedup_preserving_order(keywords)
}

pub struct ProductsPage<'a> {
    engine: &'a Engine,
}

impl<'a> ProductsPage<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Heading first, then any product row
    pub async fn wait_for_products(&self) -> bool {
        let timeout = self.engine.config().products_timeout();
        if self
            .engine
            .resolve_present(&heading_candidates(), timeout)
            .await
        {
            return true;
        }
        log::debug!("catalog heading missing, looking for product rows");
        self.engine
            .resolve_present(&row_candidates(), timeout.min(ROW_WAIT_CAP))
            .await
    }

    pub async fn get_all_product_titles(&self) -> Vec<String> {
        let handles = self
            .engine
            .find_all(&LocatorCandidate::by_predicate(
                "type == 'XCUIElementTypeStaticText' AND (label CONTAINS 'Sauce' OR label CONTAINS 'Test.allTheThings' OR name CONTAINS 'test-Item title')",
            ))
            .await;
        let titles = dedup_preserving_order(self.engine.texts_of(&handles).await);
        if !titles.is_empty() {
            return titles;
        }

        let mut scoped = Vec::new();
        for item in self
            .engine
            .find_all(&LocatorCandidate::by_accessibility_id("test-Item"))
            .await
        {
            scoped.push(self.title_within(&item).await);
        }
        dedup_preserving_order(scoped)
    }

    async fn title_within(&self, container: &ControlHandle) -> String {
        for candidate in [
            LocatorCandidate::by_accessibility_id("test-Item title"),
            LocatorCandidate::by_predicate(TITLE_PREDICATE),
        ] {
            if let Some(handle) = self.engine.find_within(container, &candidate).await.first() {
                let text = self.engine.text_of(handle).await;
                if !text.is_empty() {
                    return text;
                }
            }
        }
        String::new()
    }

    pub async fn open_product_details(&self, name: &str) -> bool {
        let candidates = [
            LocatorCandidate::by_predicate(format!("label == {}", predicate_literal(name))),
            LocatorCandidate::by_xpath(lower_contains_xpath(
                "XCUIElementTypeStaticText",
                &["label"],
                name,
            )),
        ];
        let deadline = self.engine.config().probe_timeout() * candidates.len() as u32;
        match self.engine.resolve_quick(&candidates, deadline).await {
            Some(control) => self.engine.tap(&control).await.succeeded,
            None => {
                log::debug!("product '{}' not on screen", name);
                false
            }
        }
    }

    /// Add the first listed product; returns its title, or `""` when nothing was added
    pub async fn add_first_product_to_cart(&self) -> String {
        let items = self
            .engine
            .find_all(&LocatorCandidate::by_accessibility_id("test-Item"))
            .await;
        if let Some(first) = items.first() {
            let title = self.title_within(first).await;
            for candidate in add_button_candidates() {
                let Some(handle) = self.engine.find_within(first, &candidate).await.into_iter().next() else {
                    continue;
                };
                let button = self.engine.control(handle).await;
                if self.engine.tap(&button).await.succeeded {
                    log::info!("added '{}' to cart", title);
                    return title;
                }
            }
            log::debug!("no usable add button inside the first item, trying a global one");
        }

        let buttons = self
            .engine
            .find_all(&LocatorCandidate::by_predicate("label CONTAINS 'ADD TO CART'"))
            .await;
        let Some(handle) = buttons.into_iter().next() else {
            log::warn!("no add-to-cart button on screen");
            return String::new();
        };
        let title = self.title_near(&handle).await;
        let button = self.engine.control(handle).await;
        if self.engine.tap(&button).await.succeeded {
            title
        } else {
            String::new()
        }
    }

    /// Title from the nearest container ancestor that holds one
    async fn title_near(&self, button: &ControlHandle) -> String {
        let mut containers = self
            .engine
            .find_within(
                button,
                &LocatorCandidate::by_xpath("ancestor::XCUIElementTypeOther"),
            )
            .await;
        containers.reverse();

        let title = LocatorCandidate::by_predicate(TITLE_PREDICATE);
        for container in &containers {
            if let Some(handle) = self.engine.find_within(container, &title).await.first() {
                let text = self.engine.text_of(handle).await;
                if !text.is_empty() {
                    return text;
                }
            }
        }
        String::new()
    }

    pub async fn is_sort_present(&self, timeout: Duration) -> bool {
        self.engine.resolve_present(&sort_candidates(), timeout).await
    }

    /// Tap the sort control, or look for sorting inside the side menu
    pub async fn open_sort_menu(&self) -> bool {
        let candidates = sort_candidates();
        let config = self.engine.config();
        let deadline = config.probe_timeout() * candidates.len() as u32;
        if let Some(control) = self.engine.resolve_quick(&candidates, deadline).await {
            if self.engine.tap(&control).await.succeeded {
                return true;
            }
        }

        log::debug!("no direct sort control, trying the side menu");
        let Some(menu) = self
            .engine
            .find_direct(
                &LocatorCandidate::by_accessibility_id("test-Menu"),
                config.probe_timeout(),
            )
            .await
        else {
            return false;
        };
        // opening the menu is best-effort; the entry lookup decides
        self.engine.tap(&menu).await;
        let entry = LocatorCandidate::by_xpath(lower_contains_xpath("*", &["label", "text"], "sort"));
        match self
            .engine
            .find_direct(&entry, config.transition_timeout())
            .await
        {
            Some(control) => self.engine.tap(&control).await.succeeded,
            None => false,
        }
    }

    pub async fn select_sort_option(&self, label: &str) -> bool {
        self.select_sort_tier(label).await.is_some()
    }

    /// Run the sort-option tiers; returns the tier that activated a node
    pub async fn select_sort_tier(&self, label: &str) -> Option<SortTier> {
        let wait = self.engine.config().option_wait();

        let exact = LocatorCandidate::by_accessibility_id(label);
        if let Some(control) = self.engine.find_direct(&exact, wait).await {
            if self.activate(&control, SortTier::Exact).await {
                return Some(SortTier::Exact);
            }
        }

        let content = [
            LocatorCandidate::by_xpath(lower_contains_xpath(
                "XCUIElementTypeOther",
                &["label", "name", "value"],
                label,
            )),
            LocatorCandidate::by_xpath(lower_contains_xpath(
                "*",
                &["label", "name", "value", "text", "content-desc"],
                label,
            )),
        ];
        if let Some(control) = self.engine.resolve_quick(&content, wait).await {
            if self.activate(&control, SortTier::Content).await {
                return Some(SortTier::Content);
            }
        }

        for keyword in sort_keywords(label) {
            let candidate =
                LocatorCandidate::by_xpath(lower_contains_xpath("*", &["label", "text"], &keyword));
            let Some(handle) = self.engine.find_all(&candidate).await.into_iter().next() else {
                continue;
            };
            let control = self.engine.control(handle).await;
            if self.activate(&control, SortTier::Keyword).await {
                log::debug!("sort option '{}' matched keyword '{}'", label, keyword);
                return Some(SortTier::Keyword);
            }
        }

        log::warn!("sort option '{}' not selectable", label);
        None
    }

    async fn activate(&self, control: &ResolvedControl, tier: SortTier) -> bool {
        let outcome = self.engine.tap(control).await;
        if !outcome.succeeded {
            log::debug!("sort tier {} found a node but could not tap it", tier);
        }
        outcome.succeeded
    }

    /// Prices on screen in display order; each scan is wider than the last
    pub async fn collect_visible_prices(&self) -> Vec<f64> {
        let scans = [
            LocatorCandidate::by_predicate(
                "type == 'XCUIElementTypeStaticText' AND label CONTAINS '$'",
            ),
            LocatorCandidate::by_xpath(
                "//*[contains(text(), '$') or contains(text(), '₹') or contains(text(), 'Rs') or contains(@label, '$')]",
            ),
            LocatorCandidate::by_xpath("//XCUIElementTypeStaticText | //android.widget.TextView"),
        ];

        for scan in &scans {
            let handles = self.engine.find_all(scan).await;
            let prices: Vec<f64> = self
                .engine
                .texts_of(&handles)
                .await
                .iter()
                .filter_map(|text| extract_price(text))
                .collect();
            if !prices.is_empty() {
                return prices;
            }
            log::debug!("price scan {} found nothing, widening", scan);
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::replay::ReplaySession;
    use crate::pages::fixtures;

    fn products() -> ReplaySession {
        ReplaySession::new("products", fixtures::PRODUCTS).unwrap()
    }

    #[test]
    fn test_sort_keywords() {
        assert_eq!(
            sort_keywords("Price (low to high)"),
            vec!["low to high", "price (low"]
        );
        assert_eq!(sort_keywords("Name (Z to A)"), vec!["z to a", "name (z"]);
        assert_eq!(sort_keywords("Newest"), vec!["newest"]);
        assert!(sort_keywords("").is_empty());
    }

    #[tokio::test]
    async fn test_sort_option_never_picks_the_opposite_order() {
        let xml = r#"<AppiumAUT>
  <XCUIElementTypeOther type="XCUIElementTypeOther" label="Price (high to low)" x="0" y="600" width="390" height="50"/>
</AppiumAUT>"#;
        let (session, engine) = fixtures::engine(ReplaySession::new("sort", xml).unwrap());
        assert!(
            !ProductsPage::new(&engine)
                .select_sort_option("Price (low to high)")
                .await
        );
        assert!(session.action_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_products_sees_heading() {
        let (_, engine) = fixtures::engine(products());
        assert!(ProductsPage::new(&engine).wait_for_products().await);
    }

    #[tokio::test]
    async fn test_wait_for_products_falls_back_to_rows() {
        let xml = r#"<AppiumAUT>
  <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item">
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="$15.99"/>
  </XCUIElementTypeOther>
</AppiumAUT>"#;
        let (_, engine) = fixtures::engine(ReplaySession::new("rows", xml).unwrap());
        assert!(ProductsPage::new(&engine).wait_for_products().await);

        let (_, engine) = fixtures::engine(ReplaySession::empty());
        assert!(!ProductsPage::new(&engine).wait_for_products().await);
    }

    #[tokio::test]
    async fn test_product_titles_in_display_order() {
        let (_, engine) = fixtures::engine(products());
        assert_eq!(
            ProductsPage::new(&engine).get_all_product_titles().await,
            vec!["Sauce Labs Backpack", "Sauce Labs Bike Light"]
        );
    }

    #[tokio::test]
    async fn test_product_titles_from_scoped_lookup() {
        let xml = r#"<AppiumAUT>
  <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item">
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item title" value="Bolt T-Shirt"/>
  </XCUIElementTypeOther>
</AppiumAUT>"#;
        let (_, engine) = fixtures::engine(ReplaySession::new("items", xml).unwrap());
        assert_eq!(
            ProductsPage::new(&engine).get_all_product_titles().await,
            vec!["Bolt T-Shirt"]
        );
    }

    #[tokio::test]
    async fn test_add_first_product_uses_first_container() {
        let (session, engine) = fixtures::engine(products());
        let title = ProductsPage::new(&engine).add_first_product_to_cart().await;
        assert_eq!(title, "Sauce Labs Backpack");

        let taps: Vec<_> = session.action_log().await;
        assert_eq!(taps.len(), 1);
        assert_eq!(taps[0].target.as_deref(), Some("test-ADD TO CART"));
    }

    #[tokio::test]
    async fn test_add_via_global_button_takes_nearest_title() {
        let session = ReplaySession::new("flat", fixtures::PRODUCTS_FLAT).unwrap();
        let (_, engine) = fixtures::engine(session);
        assert_eq!(
            ProductsPage::new(&engine).add_first_product_to_cart().await,
            "Sauce Labs Onesie"
        );
    }

    #[tokio::test]
    async fn test_add_returns_empty_when_tap_fails() {
        let session = ReplaySession::new("flat", fixtures::PRODUCTS_FLAT)
            .unwrap()
            .reject("click")
            .reject("tapElement")
            .reject("tapPoint");
        let (_, engine) = fixtures::engine(session);
        assert_eq!(ProductsPage::new(&engine).add_first_product_to_cart().await, "");
    }

    #[tokio::test]
    async fn test_open_product_details() {
        let session = products()
            .with_screen("details", fixtures::DETAILS)
            .unwrap()
            .with_transition("products", "tap", Some("Sauce Labs Backpack"), "details");
        let (session, engine) = fixtures::engine(session);
        let page = ProductsPage::new(&engine);
        assert!(page.open_product_details("Sauce Labs Backpack").await);
        assert_eq!(session.current_screen().await, "details");
        assert!(!page.open_product_details("Sauce Labs Fleece Jacket").await);
    }

    #[tokio::test]
    async fn test_sort_flow_orders_prices() {
        let session = products()
            .with_screen("sort", fixtures::SORT_MENU)
            .unwrap()
            .with_screen("sorted", fixtures::PRODUCTS_SORTED)
            .unwrap()
            .with_transition("products", "tap", Some("test-Modal Selector Button"), "sort")
            .with_transition("sort", "tap", Some("Price (low to high)"), "sorted");
        let (session, engine) = fixtures::engine(session);
        let page = ProductsPage::new(&engine);

        assert_eq!(page.collect_visible_prices().await, vec![29.99, 9.99]);
        assert!(page.is_sort_present(Duration::from_millis(100)).await);
        assert!(page.open_sort_menu().await);
        assert_eq!(
            page.select_sort_tier("Price (low to high)").await,
            Some(SortTier::Exact)
        );
        assert_eq!(session.current_screen().await, "sorted");
        assert_eq!(page.collect_visible_prices().await, vec![7.99, 9.99, 29.99]);
    }

    #[tokio::test]
    async fn test_sort_option_by_content_match() {
        let session = ReplaySession::new("sort", fixtures::SORT_MENU_LABELS_ONLY).unwrap();
        let (_, engine) = fixtures::engine(session);
        let page = ProductsPage::new(&engine);
        assert_eq!(
            page.select_sort_tier("Price (low to high)").await,
            Some(SortTier::Content)
        );
        assert!(page.select_sort_option("Price (high to low)").await);
    }

    #[tokio::test]
    async fn test_sort_option_falls_through_to_keywords() {
        let xml = r#"<AppiumAUT>
  <XCUIElementTypeOther type="XCUIElementTypeOther" label="Lowest price" x="0" y="600" width="390" height="50"/>
  <XCUIElementTypeOther type="XCUIElementTypeOther" label="Price, low to high" x="0" y="650" width="390" height="50"/>
</AppiumAUT>"#;
        let (session, engine) = fixtures::engine(ReplaySession::new("sort", xml).unwrap());
        assert_eq!(
            ProductsPage::new(&engine)
                .select_sort_tier("Price (low to high)")
                .await,
            Some(SortTier::Keyword)
        );
        let log = session.action_log().await;
        assert_eq!(log[0].target.as_deref(), Some("Price, low to high"));
    }

    #[tokio::test]
    async fn test_sort_absent() {
        let (_, engine) = fixtures::engine(ReplaySession::new("cart", fixtures::CART).unwrap());
        let page = ProductsPage::new(&engine);
        assert!(!page.is_sort_present(Duration::ZERO).await);
        assert!(!page.select_sort_option("Price (low to high)").await);
    }

    #[tokio::test]
    async fn test_prices_from_wider_scans() {
        let android = r#"<hierarchy>
  <node class="android.widget.TextView" text="Sauce Labs Backpack"/>
  <node class="android.widget.TextView" text="$29.99"/>
</hierarchy>"#;
        let (_, engine) = fixtures::engine(ReplaySession::new("a", android).unwrap());
        assert_eq!(ProductsPage::new(&engine).collect_visible_prices().await, vec![29.99]);

        let bare = r#"<AppiumAUT>
  <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Total"/>
  <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="1,249.50"/>
</AppiumAUT>"#;
        let (_, engine) = fixtures::engine(ReplaySession::new("b", bare).unwrap());
        assert_eq!(ProductsPage::new(&engine).collect_visible_prices().await, vec![1249.5]);
    }
}
