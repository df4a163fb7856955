//! Interaction engine: taps with ordered fallback modes, text entry

use super::resolve::ResolvedControl;
use crate::driver::traits::{Action, AutomationSession, ProbeError};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionMode {
    /// Native element click
    Direct,
    /// `mobile: tap` addressed by element
    ElementTap,
    /// `mobile: tap` at the element's center
    CoordinateTap,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionMode::Direct => "direct",
            InteractionMode::ElementTap => "elementTap",
            InteractionMode::CoordinateTap => "coordinateTap",
        };
        f.write_str(name)
    }
}

/// Tap modes in the order they are attempted
pub const TAP_MODES: [InteractionMode; 3] = [
    InteractionMode::Direct,
    InteractionMode::ElementTap,
    InteractionMode::CoordinateTap,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeFailure {
    pub mode: InteractionMode,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionOutcome {
    pub succeeded: bool,
    /// Mode that succeeded, or the last one attempted
    pub mode_used: InteractionMode,
    pub failures: Vec<ModeFailure>,
}

async fn attempt(
    session: &dyn AutomationSession,
    control: &ResolvedControl,
    mode: InteractionMode,
) -> Result<(), ProbeError> {
    let handle = control.handle.clone();
    match mode {
        InteractionMode::Direct => session.act(Action::Click(handle)).await,
        InteractionMode::ElementTap => session.act(Action::TapElement(handle)).await,
        InteractionMode::CoordinateTap => {
            let rect = match control.geometry {
                Some(rect) => rect,
                None => session.rect(&handle).await?,
            };
            let (x, y) = rect.center();
            session.act(Action::TapPoint { x, y }).await
        }
    }
}

/// Tap `control`, falling through `TAP_MODES` until one is accepted
pub async fn tap(session: &dyn AutomationSession, control: &ResolvedControl) -> InteractionOutcome {
    let mut failures = Vec::new();

    for mode in TAP_MODES {
        match attempt(session, control, mode).await {
            Ok(()) => {
                if !failures.is_empty() {
                    log::debug!("tap on {} succeeded via {}", control.handle, mode);
                }
                return InteractionOutcome {
                    succeeded: true,
                    mode_used: mode,
                    failures,
                };
            }
            Err(e) => {
                log::debug!("tap mode {} failed on {}: {}", mode, control.handle, e);
                failures.push(ModeFailure {
                    mode,
                    reason: e.to_string(),
                });
            }
        }
    }

    log::warn!("every tap mode failed on {}", control.handle);
    InteractionOutcome {
        succeeded: false,
        mode_used: InteractionMode::CoordinateTap,
        failures,
    }
}

/// Clear (best-effort) then type `text` once
pub async fn enter_text(
    session: &dyn AutomationSession,
    control: &ResolvedControl,
    text: &str,
) -> Result<(), ProbeError> {
    if let Err(e) = session.act(Action::Clear(control.handle.clone())).await {
        log::debug!("clear ignored on {}: {}", control.handle, e);
    }
    session
        .act(Action::SendKeys(control.handle.clone(), text.to_string()))
        .await
}
