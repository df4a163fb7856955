//! UI-elements sample app

use super::lower_contains_xpath;
use crate::driver::traits::LocatorCandidate;
use crate::engine::Engine;
use std::time::Duration;

fn app_ready_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-Page"),
        LocatorCandidate::by_accessibility_id("test-Title"),
        LocatorCandidate::by_predicate(
            "type == 'XCUIElementTypeStaticText' AND label CONTAINS 'Welcome'",
        ),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().className("android.widget.TextView")"#),
    ]
}

fn alert_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_class("XCUIElementTypeAlert"),
        LocatorCandidate::by_id("android:id/alertTitle"),
    ]
}

fn alert_ok_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("OK"),
        LocatorCandidate::by_xpath("//XCUIElementTypeAlert//XCUIElementTypeButton"),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().resourceId("android:id/button1")"#),
        LocatorCandidate::by_xpath(lower_contains_xpath("*", &["label", "text"], "ok")),
    ]
}

pub struct SamplePage<'a> {
    engine: &'a Engine,
}

impl<'a> SamplePage<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    fn wait(&self) -> Duration {
        self.engine.config().transition_timeout()
    }

    /// Any landing indicator, else any static text at all
    pub async fn wait_for_app(&self) -> bool {
        if self
            .engine
            .resolve_present(&app_ready_candidates(), self.wait())
            .await
        {
            return true;
        }
        self.engine
            .resolve_present(
                &[LocatorCandidate::by_xpath(
                    "//XCUIElementTypeStaticText | //android.widget.TextView",
                )],
                self.engine.config().probe_timeout(),
            )
            .await
    }

    async fn tap_first(&self, candidates: &[LocatorCandidate], what: &str) -> bool {
        let deadline = self.engine.config().probe_timeout() * candidates.len() as u32;
        match self.engine.resolve(candidates, deadline).await {
            Ok(found) => self.engine.tap(&found.control).await.succeeded,
            Err(e) => {
                log::debug!("{} not found: {}", what, e);
                false
            }
        }
    }

    pub async fn open_ui_elements(&self) -> bool {
        self.tap_first(
            &[
                LocatorCandidate::by_accessibility_id("test-UI Elements"),
                LocatorCandidate::by_xpath(lower_contains_xpath(
                    "*",
                    &["label", "text"],
                    "ui elements",
                )),
            ],
            "UI elements entry",
        )
        .await
    }

    pub async fn tap_text_button(&self) -> bool {
        self.tap_first(
            &[
                LocatorCandidate::by_accessibility_id("test-Text Button"),
                LocatorCandidate::by_xpath(lower_contains_xpath(
                    "*",
                    &["label", "text"],
                    "text button",
                )),
            ],
            "text button",
        )
        .await
    }

    /// Current text of the sample label, `""` when absent or blank
    pub async fn get_static_text(&self) -> String {
        let candidate = LocatorCandidate::by_accessibility_id("test-Text");
        match self.engine.find_direct(&candidate, self.wait()).await {
            Some(control) => self.engine.text_of(&control.handle).await,
            None => String::new(),
        }
    }

    /// Press the text button and wait for the label to fill in
    pub async fn get_text_from_button(&self) -> String {
        if !self.tap_text_button().await {
            return String::new();
        }
        let candidate = LocatorCandidate::by_accessibility_id("test-Text");
        let (text, _) = self
            .engine
            .poll_value(
                || async {
                    let handle = self.engine.find_all(&candidate).await.into_iter().next()?;
                    let text = self.engine.text_of(&handle).await;
                    (!text.is_empty()).then_some(text)
                },
                self.wait(),
            )
            .await;
        text.unwrap_or_default()
    }

    pub async fn tap_alert(&self) -> bool {
        self.tap_first(
            &[
                LocatorCandidate::by_accessibility_id("test-Alert"),
                LocatorCandidate::by_xpath(lower_contains_xpath(
                    "XCUIElementTypeButton",
                    &["label", "name"],
                    "alert",
                )),
            ],
            "alert button",
        )
        .await
    }

    pub async fn is_alert_present(&self, timeout: Duration) -> bool {
        self.engine.resolve_present(&alert_candidates(), timeout).await
    }

    /// Dismiss the visible alert with its OK button
    pub async fn close_alert_ok(&self) -> bool {
        let candidates = alert_ok_candidates();
        match self.engine.resolve(&candidates, self.wait()).await {
            Ok(found) => {
                if found.index > 0 {
                    log::debug!("alert OK matched by fallback candidate {}", found.index);
                }
                self.engine.tap(&found.control).await.succeeded
            }
            Err(_) => false,
        }
    }

    pub async fn open_alert_and_close(&self) -> bool {
        if !self.tap_alert().await {
            return false;
        }
        if !self.is_alert_present(self.wait()).await {
            log::warn!("alert button tapped but no alert appeared");
        }
        self.close_alert_ok().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::replay::ReplaySession;
    use crate::pages::fixtures;

    fn sample_app() -> ReplaySession {
        ReplaySession::new("home", fixtures::SAMPLE_HOME)
            .unwrap()
            .with_screen("elements", fixtures::SAMPLE_ELEMENTS)
            .unwrap()
            .with_screen("text", fixtures::SAMPLE_TEXT_SHOWN)
            .unwrap()
            .with_screen("alert", fixtures::SAMPLE_ALERT)
            .unwrap()
            .with_transition("home", "tap", Some("test-UI Elements"), "elements")
            .with_transition("elements", "tap", Some("test-Text Button"), "text")
            .with_transition("elements", "tap", Some("test-Alert"), "alert")
            .with_transition("alert", "tap", Some("OK"), "elements")
    }

    #[tokio::test]
    async fn test_navigation_and_text_button() {
        let (session, engine) = fixtures::engine(sample_app());
        let page = SamplePage::new(&engine);

        assert!(page.wait_for_app().await);
        assert!(page.open_ui_elements().await);
        assert_eq!(page.get_static_text().await, "");
        assert_eq!(page.get_text_from_button().await, "Hello World!");
        assert_eq!(session.current_screen().await, "text");
    }

    #[tokio::test]
    async fn test_alert_open_and_close() {
        let (session, engine) = fixtures::engine(sample_app());
        let page = SamplePage::new(&engine);

        assert!(page.open_ui_elements().await);
        assert!(!page.is_alert_present(Duration::ZERO).await);
        assert!(page.open_alert_and_close().await);
        assert_eq!(session.current_screen().await, "elements");
    }

    #[tokio::test]
    async fn test_blank_app_is_not_ready() {
        let (_, engine) = fixtures::engine(ReplaySession::empty());
        let page = SamplePage::new(&engine);
        assert!(!page.wait_for_app().await);
        assert!(!page.close_alert_ok().await);
    }
}
