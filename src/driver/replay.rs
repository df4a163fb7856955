//! Replay session
//!
//! An in-memory `AutomationSession` that serves captured page-source
//! snapshots. Screens switch when an action hits a scripted trigger or after
//! a number of tree reads (to model content that renders late). Element
//! handles carry the screen generation they were issued for and are rejected
//! once the screen has changed.

use super::query;
use super::source::PageSource;
use super::traits::{
    Action, AutomationSession, ControlHandle, NodeText, ProbeError, Rect, SessionFactory, Strategy,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Interval between tree reads while `find_one` waits
const FIND_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Action trigger; `action: tap` matches any activation (click or tap)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub action: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub screen: String,
    pub on: Trigger,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settle {
    pub screen: String,
    pub after_reads: u32,
    pub to: String,
}

/// Replay script as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub start: String,
    pub screens: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub screenshot: Option<PathBuf>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub settle: Vec<Settle>,
    /// Action kinds the replayed device refuses (`click`, `tapElement`, ...)
    #[serde(default)]
    pub reject: Vec<String>,
}

impl ReplayScript {
    /// Load a script; screen paths are relative to the script's directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script: {}", path.display()))?;
        let mut script: ReplayScript = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid replay script: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for screen in script.screens.values_mut() {
            if screen.is_relative() {
                *screen = base.join(&*screen);
            }
        }
        if let Some(shot) = script.screenshot.as_mut() {
            if shot.is_relative() {
                *shot = base.join(&*shot);
            }
        }

        Ok(script)
    }
}

#[derive(Debug)]
struct Screen {
    xml: String,
    source: PageSource,
}

/// One performed action, as seen by the replayed device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub action: String,
    pub screen: String,
    /// Accessibility id, label or resource id of the target node
    pub target: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug)]
struct ReplayState {
    current: String,
    generation: u64,
    reads: u32,
    log: Vec<ActionRecord>,
}

/// In-memory session over captured page sources
pub struct ReplaySession {
    id: String,
    screens: HashMap<String, Arc<Screen>>,
    transitions: Vec<Transition>,
    settle: Vec<Settle>,
    rejected: HashSet<String>,
    screenshot: Option<Vec<u8>>,
    state: Mutex<ReplayState>,
}

impl ReplaySession {
    /// Session showing a single screen named `start`
    pub fn new(start: &str, xml: &str) -> Result<Self> {
        let mut session = Self {
            id: uuid::Uuid::new_v4().to_string(),
            screens: HashMap::new(),
            transitions: Vec::new(),
            settle: Vec::new(),
            rejected: HashSet::new(),
            screenshot: None,
            state: Mutex::new(ReplayState {
                current: start.to_string(),
                generation: 0,
                reads: 0,
                log: Vec::new(),
            }),
        };
        session.add_screen(start, xml)?;
        Ok(session)
    }

    /// Session whose tree holds nothing but the root node
    pub fn empty() -> Self {
        let xml = "<AppiumAUT/>";
        let screen = Screen {
            xml: xml.to_string(),
            source: PageSource::parse(xml).unwrap_or_default(),
        };
        let mut screens = HashMap::new();
        screens.insert("empty".to_string(), Arc::new(screen));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            screens,
            transitions: Vec::new(),
            settle: Vec::new(),
            rejected: HashSet::new(),
            screenshot: None,
            state: Mutex::new(ReplayState {
                current: "empty".to_string(),
                generation: 0,
                reads: 0,
                log: Vec::new(),
            }),
        }
    }

    /// Build a session from a loaded script
    pub fn from_script(script: &ReplayScript) -> Result<Self> {
        let start_path = script
            .screens
            .get(&script.start)
            .with_context(|| format!("Start screen '{}' is not defined", script.start))?;
        let start_xml = std::fs::read_to_string(start_path)
            .with_context(|| format!("Failed to read screen: {}", start_path.display()))?;

        let mut session = Self::new(&script.start, &start_xml)?;
        for (name, path) in &script.screens {
            if name == &script.start {
                continue;
            }
            let xml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read screen: {}", path.display()))?;
            session.add_screen(name, &xml)?;
        }

        for t in &script.transitions {
            session.check_screen(&t.screen)?;
            session.check_screen(&t.to)?;
        }
        for s in &script.settle {
            session.check_screen(&s.screen)?;
            session.check_screen(&s.to)?;
        }
        session.transitions = script.transitions.clone();
        session.settle = script.settle.clone();
        session.rejected = script.reject.iter().cloned().collect();

        if let Some(path) = &script.screenshot {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read screenshot: {}", path.display()))?;
            session.screenshot = Some(bytes);
        }

        Ok(session)
    }

    fn check_screen(&self, name: &str) -> Result<()> {
        if !self.screens.contains_key(name) {
            anyhow::bail!("Unknown screen '{}' in replay script", name);
        }
        Ok(())
    }

    fn add_screen(&mut self, name: &str, xml: &str) -> Result<()> {
        let source = PageSource::parse(xml)
            .with_context(|| format!("Failed to parse screen '{}'", name))?;
        self.screens.insert(
            name.to_string(),
            Arc::new(Screen {
                xml: xml.to_string(),
                source,
            }),
        );
        Ok(())
    }

    pub fn with_screen(mut self, name: &str, xml: &str) -> Result<Self> {
        self.add_screen(name, xml)?;
        Ok(self)
    }

    pub fn with_transition(mut self, screen: &str, action: &str, target: Option<&str>, to: &str) -> Self {
        self.transitions.push(Transition {
            screen: screen.to_string(),
            on: Trigger {
                action: action.to_string(),
                target: target.map(str::to_string),
            },
            to: to.to_string(),
        });
        self
    }

    pub fn with_settle(mut self, screen: &str, after_reads: u32, to: &str) -> Self {
        self.settle.push(Settle {
            screen: screen.to_string(),
            after_reads,
            to: to.to_string(),
        });
        self
    }

    /// Make every action of this kind fail
    pub fn reject(mut self, action: &str) -> Self {
        self.rejected.insert(action.to_string());
        self
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = Some(bytes);
        self
    }

    pub async fn current_screen(&self) -> String {
        self.state.lock().await.current.clone()
    }

    pub async fn action_log(&self) -> Vec<ActionRecord> {
        self.state.lock().await.log.clone()
    }

    fn screen(&self, name: &str) -> Result<Arc<Screen>, ProbeError> {
        self.screens
            .get(name)
            .cloned()
            .ok_or_else(|| ProbeError::Transport(format!("unknown screen '{}'", name)))
    }

    fn switch(state: &mut ReplayState, to: &str) {
        log::debug!("replay: {} -> {}", state.current, to);
        state.current = to.to_string();
        state.generation += 1;
        state.reads = 0;
    }

    /// One tree read: applies pending settle rules, then serves the screen
    async fn read(&self) -> Result<(Arc<Screen>, u64), ProbeError> {
        let mut state = self.state.lock().await;
        if let Some(rule) = self
            .settle
            .iter()
            .find(|s| s.screen == state.current && state.reads >= s.after_reads)
        {
            Self::switch(&mut state, &rule.to);
        }
        state.reads += 1;
        Ok((self.screen(&state.current)?, state.generation))
    }

    fn handle_for(&self, generation: u64, idx: usize) -> ControlHandle {
        ControlHandle(format!("{}:{}:{}", &self.id[..8], generation, idx))
    }

    /// Resolve a handle against the current screen
    async fn node_of(&self, handle: &ControlHandle) -> Result<(Arc<Screen>, usize), ProbeError> {
        let stale = || ProbeError::StaleElement(handle.to_string());
        let mut parts = handle.id().rsplitn(3, ':');
        let idx: usize = parts.next().and_then(|p| p.parse().ok()).ok_or_else(stale)?;
        let generation: u64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(stale)?;
        let owner = parts.next().ok_or_else(stale)?;

        let state = self.state.lock().await;
        if owner != &self.id[..8] || generation != state.generation {
            return Err(stale());
        }
        let screen = self.screen(&state.current)?;
        if idx >= screen.source.len() {
            return Err(stale());
        }
        Ok((screen, idx))
    }

    fn trigger_matches(trigger: &Trigger, action: &Action, target_names: &[&str]) -> bool {
        let action_ok = trigger.action == action.name()
            || (trigger.action == "tap"
                && matches!(
                    action,
                    Action::Click(_) | Action::TapElement(_) | Action::TapPoint { .. }
                ));
        let target_ok = match &trigger.target {
            None => true,
            Some(t) => target_names.contains(&t.as_str()),
        };
        action_ok && target_ok
    }
}

#[async_trait]
impl AutomationSession for ReplaySession {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn find_one(
        &self,
        strategy: Strategy,
        expression: &str,
        timeout: Duration,
    ) -> Result<ControlHandle, ProbeError> {
        let start = Instant::now();
        loop {
            let (screen, generation) = self.read().await?;
            let hits = query::select(&screen.source, strategy, expression, None)?;
            if let Some(&idx) = hits.first() {
                return Ok(self.handle_for(generation, idx));
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(ProbeError::NotFound {
                    strategy,
                    expression: expression.to_string(),
                });
            }
            tokio::time::sleep(FIND_POLL_INTERVAL.min(timeout - elapsed)).await;
        }
    }

    async fn find_all(
        &self,
        strategy: Strategy,
        expression: &str,
    ) -> Result<Vec<ControlHandle>, ProbeError> {
        let (screen, generation) = self.read().await?;
        Ok(query::select(&screen.source, strategy, expression, None)?
            .into_iter()
            .map(|idx| self.handle_for(generation, idx))
            .collect())
    }

    async fn find_all_within(
        &self,
        parent: &ControlHandle,
        strategy: Strategy,
        expression: &str,
    ) -> Result<Vec<ControlHandle>, ProbeError> {
        let (screen, root) = self.node_of(parent).await?;
        let generation = self.state.lock().await.generation;
        Ok(query::select(&screen.source, strategy, expression, Some(root))?
            .into_iter()
            .map(|idx| self.handle_for(generation, idx))
            .collect())
    }

    async fn act(&self, action: Action) -> Result<(), ProbeError> {
        if self.rejected.contains(action.name()) {
            return Err(ProbeError::ActionFailed {
                action: action.name(),
                reason: "rejected by replay script".into(),
            });
        }

        let (screen, target) = match (&action, action.target()) {
            (_, Some(handle)) => {
                let (screen, idx) = self.node_of(handle).await?;
                (screen, Some(idx))
            }
            (Action::TapPoint { x, y }, None) => {
                let state = self.state.lock().await;
                let screen = self.screen(&state.current)?;
                drop(state);
                // deepest node whose frame contains the point
                let hit = screen.source.nodes.iter().enumerate().rev().find_map(|(i, n)| {
                    n.rect().filter(|r| {
                        r.width > 0.0
                            && r.height > 0.0
                            && r.contains(&Rect {
                                x: *x as f64,
                                y: *y as f64,
                                width: 0.0,
                                height: 0.0,
                            })
                    })
                    .map(|_| i)
                });
                (screen, hit)
            }
            (_, None) => return Err(ProbeError::Transport("action without target".into())),
        };

        let node = target.and_then(|i| screen.source.node(i));
        let target_names: Vec<&str> = node
            .map(|n| {
                [n.accessibility_id(), n.label(), n.text(), n.resource_id()]
                    .into_iter()
                    .flatten()
                    .collect()
            })
            .unwrap_or_default();

        let mut state = self.state.lock().await;
        let screen_name = state.current.clone();
        state.log.push(ActionRecord {
            action: action.name().to_string(),
            screen: screen_name,
            target: target_names.first().map(|s| s.to_string()),
            text: match &action {
                Action::SendKeys(_, text) => Some(text.clone()),
                _ => None,
            },
        });

        if let Some(t) = self
            .transitions
            .iter()
            .find(|t| t.screen == state.current && Self::trigger_matches(&t.on, &action, &target_names))
        {
            Self::switch(&mut state, &t.to);
        }
        Ok(())
    }

    async fn node_text(&self, handle: &ControlHandle) -> Result<NodeText, ProbeError> {
        let (screen, idx) = self.node_of(handle).await?;
        Ok(screen.source.nodes[idx].node_text())
    }

    async fn rect(&self, handle: &ControlHandle) -> Result<Rect, ProbeError> {
        let (screen, idx) = self.node_of(handle).await?;
        screen.source.nodes[idx]
            .rect()
            .ok_or_else(|| ProbeError::Transport(format!("no geometry for {}", handle)))
    }

    async fn snapshot_tree(&self) -> Result<String, ProbeError> {
        let (screen, _) = self.read().await?;
        Ok(screen.xml.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ProbeError> {
        self.screenshot
            .clone()
            .ok_or_else(|| ProbeError::Transport("replay script has no screenshot".into()))
    }
}

/// Opens a fresh replay session per scenario
pub struct ReplayFactory {
    script: ReplayScript,
}

impl ReplayFactory {
    pub fn new(script: ReplayScript) -> Self {
        Self { script }
    }
}

#[async_trait]
impl SessionFactory for ReplayFactory {
    async fn open(&self, scenario: &str) -> Result<Arc<dyn AutomationSession>> {
        let session = ReplaySession::from_script(&self.script)
            .with_context(|| format!("Failed to open replay session for '{}'", scenario))?;
        log::info!("Opened replay session {} for {}", session.session_id(), scenario);
        Ok(Arc::new(session))
    }
}
