//! Login screen

use super::{lower_contains_xpath, PageError};
use crate::driver::traits::LocatorCandidate;
use crate::engine::{Engine, InteractionMode, InteractionOutcome, ResolvedControl};
use std::time::Duration;

fn username_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-Username"),
        LocatorCandidate::by_predicate(
            "type == 'XCUIElementTypeTextField' AND (label CONTAINS 'username' OR name CONTAINS 'username' OR value CONTAINS 'username')",
        ),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().className("android.widget.EditText").instance(0)"#),
        LocatorCandidate::by_xpath("//XCUIElementTypeTextField"),
    ]
}

fn password_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-Password"),
        LocatorCandidate::by_predicate(
            "type == 'XCUIElementTypeSecureTextField' AND (label CONTAINS 'password' OR name CONTAINS 'password' OR value CONTAINS 'password')",
        ),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().className("android.widget.EditText").instance(1)"#),
        LocatorCandidate::by_xpath("//XCUIElementTypeSecureTextField"),
    ]
}

fn button_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-LOGIN"),
        LocatorCandidate::by_predicate(
            "type == 'XCUIElementTypeButton' AND (label CONTAINS 'LOGIN' OR name CONTAINS 'LOGIN' OR label CONTAINS 'Log in' OR label CONTAINS 'Log In')",
        ),
        LocatorCandidate::by_xpath(lower_contains_xpath(
            "XCUIElementTypeButton",
            &["label", "name"],
            "login",
        )),
        LocatorCandidate::by_xpath(lower_contains_xpath(
            "XCUIElementTypeButton",
            &["label", "name"],
            "log in",
        )),
    ]
}

fn error_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_predicate(
            "type == 'XCUIElementTypeStaticText' AND (label CONTAINS[c] 'error' OR label CONTAINS[c] 'invalid' OR label CONTAINS 'Username' OR label CONTAINS[c] 'do not match')",
        ),
        LocatorCandidate::by_xpath(format!(
            "{} | {}",
            lower_contains_xpath("XCUIElementTypeStaticText", &["label", "value"], "invalid"),
            lower_contains_xpath("XCUIElementTypeStaticText", &["label", "value"], "do not match"),
        )),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().textContains("do not match")"#),
        LocatorCandidate::by_xpath(
            "//*[contains(@label, 'Epic sadface') or contains(@text, 'Epic sadface') or contains(@label, 'Username and password do not match')]",
        ),
        LocatorCandidate::by_accessibility_id("test-Error message"),
    ]
}

fn menu_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-Menu"),
        LocatorCandidate::by_predicate("name CONTAINS[c] 'menu' OR label CONTAINS[c] 'menu'"),
        LocatorCandidate::by_uiautomator(r#"new UiSelector().descriptionContains("menu")"#),
    ]
}

fn logout_candidates() -> Vec<LocatorCandidate> {
    vec![
        LocatorCandidate::by_accessibility_id("test-LOGOUT"),
        LocatorCandidate::by_predicate("label ==[c] 'LOGOUT' OR name ==[c] 'LOGOUT'"),
        LocatorCandidate::by_xpath(lower_contains_xpath("*", &["label", "name", "text"], "logout")),
    ]
}

/// How a login submission went
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    /// Outcome of the login button tap
    pub tap: InteractionOutcome,
    /// `Some(sent)` when every tap mode failed and a newline was tried
    pub newline_fallback: Option<bool>,
    /// Fields whose text entry was rejected
    pub rejected_fields: Vec<&'static str>,
}

impl LoginOutcome {
    /// Whether the filled-in form was submitted by any route
    pub fn submitted(&self) -> bool {
        self.rejected_fields.is_empty()
            && (self.tap.succeeded || self.newline_fallback == Some(true))
    }
}

pub struct LoginPage<'a> {
    engine: &'a Engine,
}

impl<'a> LoginPage<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Probe round first, then one longer direct lookup of the first candidate
    async fn locate(&self, control: &str, candidates: &[LocatorCandidate]) -> Option<ResolvedControl> {
        let config = self.engine.config();
        let deadline = config.probe_timeout() * candidates.len() as u32;
        if let Some(found) = self.engine.resolve_quick(candidates, deadline).await {
            return Some(found);
        }
        log::debug!("login: {} not found by any candidate, retrying the first", control);
        self.engine
            .find_direct(&candidates[0], config.last_chance())
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, PageError> {
        let user = self.locate("username", &username_candidates()).await;
        let pass = self.locate("password", &password_candidates()).await;
        let button = self.locate("login button", &button_candidates()).await;

        match (user, pass, button) {
            (Some(user), Some(pass), Some(button)) => {
                Ok(self.submit(&user, &pass, &button, username, password).await)
            }
            (user, pass, button) => {
                let controls: Vec<&'static str> = [
                    ("username", user.is_none()),
                    ("password", pass.is_none()),
                    ("login button", button.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
                log::warn!("login controls missing: {}", controls.join(", "));
                Err(PageError::FatalControlMissing {
                    page: "login",
                    controls,
                })
            }
        }
    }

    async fn submit(
        &self,
        user: &ResolvedControl,
        pass: &ResolvedControl,
        button: &ResolvedControl,
        username: &str,
        password: &str,
    ) -> LoginOutcome {
        let mut rejected_fields = Vec::new();
        if let Err(e) = self.engine.enter_text(user, username).await {
            log::warn!("username entry rejected: {}", e);
            rejected_fields.push("username");
        }
        if let Err(e) = self.engine.enter_text(pass, password).await {
            log::warn!("password entry rejected: {}", e);
            rejected_fields.push("password");
        }
        if !rejected_fields.is_empty() {
            log::warn!("login not submitted, rejected fields: {}", rejected_fields.join(", "));
            return LoginOutcome {
                tap: InteractionOutcome {
                    succeeded: false,
                    mode_used: InteractionMode::Direct,
                    failures: Vec::new(),
                },
                newline_fallback: None,
                rejected_fields,
            };
        }

        let tap = self.engine.tap(button).await;
        let newline_fallback = if tap.succeeded {
            None
        } else {
            log::debug!("login button never accepted a tap, submitting with newline");
            let sent = self.engine.send_keys(pass, "\n").await;
            if let Err(e) = &sent {
                log::warn!("newline submit failed: {}", e);
            }
            Some(sent.is_ok())
        };

        LoginOutcome {
            tap,
            newline_fallback,
            rejected_fields,
        }
    }

    /// Poll for a visible login error; `""` when none shows up before `deadline`
    pub async fn get_error_text(&self, deadline: Duration) -> String {
        let (found, result) = self
            .engine
            .poll_value(|| self.scan_error(), deadline)
            .await;
        if found.is_none() {
            log::debug!(
                "no error text after {} samples in {:?}",
                result.sample_count,
                result.elapsed
            );
        }
        found.unwrap_or_default()
    }

    /// One sample across the three error tiers
    async fn scan_error(&self) -> Option<String> {
        let heuristics = &self.engine.config().error_heuristics;

        for candidate in error_candidates() {
            if let Some(handle) = self.engine.find_all(&candidate).await.first() {
                let text = self.engine.text_of(handle).await;
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }

        let containers = self
            .engine
            .find_all(&LocatorCandidate::by_xpath(
                "//XCUIElementTypeOther | //XCUIElementTypeStaticText",
            ))
            .await;
        let limit = heuristics.container_scan_limit.min(containers.len());
        for handle in &containers[..limit] {
            let text = self.engine.text_of(handle).await;
            if self.engine.has_error_keyword(&text) {
                log::debug!("error text found by container scan");
                return Some(text);
            }
        }

        let mut statics = self
            .engine
            .find_all(&LocatorCandidate::by_class("XCUIElementTypeStaticText"))
            .await;
        if statics.is_empty() {
            statics = self
                .engine
                .find_all(&LocatorCandidate::by_class("android.widget.TextView"))
                .await;
        }
        statics.truncate(heuristics.static_scan_limit);
        self.engine
            .texts_of(&statics)
            .await
            .into_iter()
            .find(|text| self.engine.is_error_like(text))
    }

    /// Log out through the side menu; true once the username field is back
    pub async fn logout(&self) -> bool {
        let config = self.engine.config();
        let Some(menu) = self
            .engine
            .resolve_quick(&menu_candidates(), config.transition_timeout())
            .await
        else {
            log::warn!("logout: menu button not found");
            return false;
        };
        if !self.engine.tap(&menu).await.succeeded {
            return false;
        }

        let Some(entry) = self
            .engine
            .resolve_quick(&logout_candidates(), config.transition_timeout())
            .await
        else {
            log::warn!("logout: menu opened but no logout entry");
            return false;
        };
        if !self.engine.tap(&entry).await.succeeded {
            return false;
        }

        self.engine
            .resolve_present(&username_candidates()[..1], config.transition_timeout())
            .await
    }
}
