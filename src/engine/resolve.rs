//! Resolution engine: ordered candidate lookup with per-candidate budgets

use crate::driver::traits::{AutomationSession, ControlHandle, LocatorCandidate, ProbeError, Rect};
use std::time::{Duration, Instant};

/// A matched control plus the geometry known when it was found
///
/// Only valid for the tree snapshot it came from; re-resolve after any
/// state-changing action.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedControl {
    pub handle: ControlHandle,
    pub geometry: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub control: ResolvedControl,
    /// Which candidate matched
    pub index: usize,
    /// Produced by the extended retry of candidate 0
    pub last_chance: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Total budget across all candidates
    pub deadline: Duration,
    /// Upper bound for a single candidate
    pub probe: Duration,
    pub last_chance: Option<Duration>,
}

async fn probe(
    session: &dyn AutomationSession,
    candidate: &LocatorCandidate,
    timeout: Duration,
) -> Result<ResolvedControl, ProbeError> {
    let handle = session
        .find_one(candidate.strategy, &candidate.expression, timeout)
        .await?;
    let geometry = session.rect(&handle).await.ok();
    Ok(ResolvedControl { handle, geometry })
}

/// Try `candidates` strictly in order; first match wins
pub async fn resolve(
    session: &dyn AutomationSession,
    candidates: &[LocatorCandidate],
    opts: ResolveOptions,
) -> Result<Resolution, ProbeError> {
    let Some(first) = candidates.first() else {
        return Err(ProbeError::NotFound {
            strategy: crate::driver::traits::Strategy::AccessibilityId,
            expression: "<no candidates>".to_string(),
        });
    };

    let start = Instant::now();
    for (index, candidate) in candidates.iter().enumerate() {
        let remaining = opts.deadline.saturating_sub(start.elapsed());
        match probe(session, candidate, opts.probe.min(remaining)).await {
            Ok(control) => {
                log::debug!("resolved {} (candidate {})", candidate, index);
                return Ok(Resolution {
                    control,
                    index,
                    last_chance: false,
                });
            }
            Err(e) => log::debug!("candidate {} [{}] failed: {}", index, candidate, e),
        }
    }

    if let Some(extended) = opts.last_chance {
        log::debug!("last-chance retry of {} for {:?}", first, extended);
        match probe(session, first, extended).await {
            Ok(control) => {
                return Ok(Resolution {
                    control,
                    index: 0,
                    last_chance: true,
                })
            }
            Err(e) => log::debug!("last-chance retry failed: {}", e),
        }
    }

    Err(ProbeError::NotFound {
        strategy: first.strategy,
        expression: first.expression.clone(),
    })
}

/// One direct lookup of a single candidate
pub async fn find_direct(
    session: &dyn AutomationSession,
    candidate: &LocatorCandidate,
    timeout: Duration,
) -> Option<ResolvedControl> {
    match probe(session, candidate, timeout).await {
        Ok(control) => Some(control),
        Err(e) => {
            log::debug!("direct lookup {} failed: {}", candidate, e);
            None
        }
    }
}

/// All matches of the first candidate that yields any, in one snapshot each
pub async fn find_all_first(
    session: &dyn AutomationSession,
    candidates: &[LocatorCandidate],
) -> Vec<ControlHandle> {
    for candidate in candidates {
        match session
            .find_all(candidate.strategy, &candidate.expression)
            .await
        {
            Ok(handles) if !handles.is_empty() => return handles,
            Ok(_) => {}
            Err(e) => log::debug!("find_all {} failed: {}", candidate, e),
        }
    }
    Vec::new()
}
