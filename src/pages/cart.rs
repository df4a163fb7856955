//! Cart screen

use crate::driver::traits::LocatorCandidate;
use crate::engine::extract::dedup_preserving_order;
use crate::engine::Engine;

fn cart_button_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-Cart"),
        LocatorCandidate::by_predicate("type == 'XCUIElementTypeButton' AND label CONTAINS 'Cart'"),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().descriptionContains("cart")"#),
    ]
}

pub struct CartPage<'a> {
    engine: &'a Engine,
}

impl<'a> CartPage<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Tap the cart button and wait for the cart heading
    pub async fn open_cart(&self) -> bool {
        let config = self.engine.config();
        let candidates = cart_button_candidates();
        let deadline = config.probe_timeout() * candidates.len() as u32;
        let Some(button) = self.engine.resolve(&candidates, deadline).await.ok() else {
            log::warn!("cart button not found");
            return false;
        };
        if !self.engine.tap(&button.control).await.succeeded {
            return false;
        }

        let heading = self
            .engine
            .poll_tree(|tree| tree.contains("YOUR CART"), config.transition_timeout())
            .await;
        if !heading.matched {
            log::warn!(
                "cart tapped but heading missing after {:?}",
                heading.elapsed
            );
        }
        heading.matched
    }

    /// Titles of the items in the cart, deduplicated
    pub async fn get_cart_items(&self) -> Vec<String> {
        let handles = self
            .engine
            .find_all_first(&[
                LocatorCandidate::by_predicate(
                    "type == 'XCUIElementTypeStaticText' AND label CONTAINS 'Sauce'",
                ),
                LocatorCandidate::by_uiautomator(r#"new UiSelector().textContains("Sauce")"#),
            ])
            .await;
        dedup_preserving_order(self.engine.texts_of(&handles).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::replay::ReplaySession;
    use crate::pages::fixtures;

    #[tokio::test]
    async fn test_open_cart_and_list_items() {
        let session = ReplaySession::new("products", fixtures::PRODUCTS)
            .unwrap()
            .with_screen("cart", fixtures::CART)
            .unwrap()
            .with_transition("products", "tap", Some("test-Cart"), "cart");
        let (session, engine) = fixtures::engine(session);
        let page = CartPage::new(&engine);

        assert!(page.open_cart().await);
        assert_eq!(session.current_screen().await, "cart");
        assert_eq!(page.get_cart_items().await, vec!["Sauce Labs Backpack"]);
    }

    #[tokio::test]
    async fn test_heading_that_never_appears() {
        let (session, engine) =
            fixtures::engine(ReplaySession::new("products", fixtures::PRODUCTS).unwrap());
        assert!(!CartPage::new(&engine).open_cart().await);
        assert_eq!(session.action_log().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cart_items_deduplicated() {
        let xml = r#"<AppiumAUT>
  <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Sauce Labs Onesie"/>
  <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Sauce Labs Onesie"/>
  <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Sauce Labs Bolt T-Shirt"/>
</AppiumAUT>"#;
        let (_, engine) = fixtures::engine(ReplaySession::new("cart", xml).unwrap());
        assert_eq!(
            CartPage::new(&engine).get_cart_items().await,
            vec!["Sauce Labs Onesie", "Sauce Labs Bolt T-Shirt"]
        );
    }

    #[tokio::test]
    async fn test_no_cart_button() {
        let (_, engine) = fixtures::engine(ReplaySession::empty());
        assert!(!CartPage::new(&engine).open_cart().await);
    }
}
