//! Resolution and interaction engine
//!
//! `Engine` binds one session to the configuration the primitives need.
//! Page façades only talk to the engine, never to the session directly.

pub mod extract;
pub mod interact;
pub mod poll;
pub mod resolve;

pub use interact::{InteractionMode, InteractionOutcome, ModeFailure};
pub use poll::{PollConfig, PollResult};
pub use resolve::{Resolution, ResolveOptions, ResolvedControl};

use crate::driver::traits::{
    Action, AutomationSession, ControlHandle, LocatorCandidate, ProbeError,
};
use crate::utils::config::Config;
use std::sync::Arc;
use std::time::Duration;

pub struct Engine {
    session: Arc<dyn AutomationSession>,
    config: Config,
}

impl Engine {
    pub fn new(session: Arc<dyn AutomationSession>, config: Config) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &dyn AutomationSession {
        self.session.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn poll_config(&self, deadline: Duration) -> PollConfig {
        PollConfig::new(deadline, self.config.poll_interval())
    }

    /// Resolve with the configured probe budget and last-chance retry
    pub async fn resolve(
        &self,
        candidates: &[LocatorCandidate],
        deadline: Duration,
    ) -> Result<Resolution, ProbeError> {
        let opts = ResolveOptions {
            deadline,
            probe: self.config.probe_timeout(),
            last_chance: (self.config.last_chance_ms > 0).then(|| self.config.last_chance()),
        };
        resolve::resolve(self.session(), candidates, opts).await
    }

    /// Resolve without the last-chance retry
    pub async fn resolve_quick(
        &self,
        candidates: &[LocatorCandidate],
        deadline: Duration,
    ) -> Option<ResolvedControl> {
        let opts = ResolveOptions {
            deadline,
            probe: self.config.probe_timeout().min(deadline),
            last_chance: None,
        };
        resolve::resolve(self.session(), candidates, opts)
            .await
            .ok()
            .map(|r| r.control)
    }

    /// Whether any candidate shows up within `timeout`
    ///
    /// Every sample checks all candidates against one snapshot each, so a
    /// late candidate is not starved by an earlier absent one.
    pub async fn resolve_present(&self, candidates: &[LocatorCandidate], timeout: Duration) -> bool {
        self.poll_present(candidates, timeout).await.matched
    }

    pub async fn find_direct(
        &self,
        candidate: &LocatorCandidate,
        timeout: Duration,
    ) -> Option<ResolvedControl> {
        resolve::find_direct(self.session(), candidate, timeout).await
    }

    /// All matches of one candidate in the current snapshot; errors give an empty list
    pub async fn find_all(&self, candidate: &LocatorCandidate) -> Vec<ControlHandle> {
        match self
            .session
            .find_all(candidate.strategy, &candidate.expression)
            .await
        {
            Ok(handles) => handles,
            Err(e) => {
                log::debug!("find_all {} failed: {}", candidate, e);
                Vec::new()
            }
        }
    }

    pub async fn find_all_first(&self, candidates: &[LocatorCandidate]) -> Vec<ControlHandle> {
        resolve::find_all_first(self.session(), candidates).await
    }

    /// Matches of `candidate` inside `parent`; errors give an empty list
    pub async fn find_within(
        &self,
        parent: &ControlHandle,
        candidate: &LocatorCandidate,
    ) -> Vec<ControlHandle> {
        match self
            .session
            .find_all_within(parent, candidate.strategy, &candidate.expression)
            .await
        {
            Ok(handles) => handles,
            Err(e) => {
                log::debug!("scoped lookup {} in {} failed: {}", candidate, parent, e);
                Vec::new()
            }
        }
    }

    /// Wrap a bare handle, fetching its geometry best-effort
    pub async fn control(&self, handle: ControlHandle) -> ResolvedControl {
        let geometry = self.session.rect(&handle).await.ok();
        ResolvedControl { handle, geometry }
    }

    pub async fn tap(&self, control: &ResolvedControl) -> InteractionOutcome {
        interact::tap(self.session(), control).await
    }

    pub async fn enter_text(&self, control: &ResolvedControl, text: &str) -> Result<(), ProbeError> {
        interact::enter_text(self.session(), control, text).await
    }

    /// Send a raw key sequence without clearing first
    pub async fn send_keys(&self, control: &ResolvedControl, keys: &str) -> Result<(), ProbeError> {
        self.session
            .act(Action::SendKeys(control.handle.clone(), keys.to_string()))
            .await
    }

    pub async fn text_of(&self, handle: &ControlHandle) -> String {
        extract::text_of(self.session(), handle).await
    }

    pub async fn texts_of(&self, handles: &[ControlHandle]) -> Vec<String> {
        extract::texts_of(self.session(), handles).await
    }

    pub fn is_error_like(&self, text: &str) -> bool {
        extract::is_error_like(text, &self.config.error_heuristics)
    }

    pub fn has_error_keyword(&self, text: &str) -> bool {
        extract::contains_keyword(text, &self.config.error_heuristics.keywords)
    }

    /// Poll the page source until `predicate` holds; failed reads count as misses
    pub async fn poll_tree<P>(&self, predicate: P, deadline: Duration) -> PollResult
    where
        P: Fn(&str) -> bool,
    {
        poll::wait_until(
            || async {
                match self.session.snapshot_tree().await {
                    Ok(tree) => predicate(&tree),
                    Err(e) => {
                        log::debug!("tree read failed while polling: {}", e);
                        false
                    }
                }
            },
            self.poll_config(deadline),
        )
        .await
    }

    /// Poll until any candidate has a match in the current snapshot
    pub async fn poll_present(&self, candidates: &[LocatorCandidate], deadline: Duration) -> PollResult {
        poll::wait_until(
            || async { !self.find_all_first(candidates).await.is_empty() },
            self.poll_config(deadline),
        )
        .await
    }

    /// Poll an arbitrary sampler, returning the first value it yields
    pub async fn poll_value<T, F, Fut>(&self, sample: F, deadline: Duration) -> (Option<T>, PollResult)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Option<T>>,
    {
        poll::poll_value(sample, self.poll_config(deadline)).await
    }
}
