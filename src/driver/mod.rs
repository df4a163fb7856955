pub mod predicate;
pub mod query;
pub mod replay;
pub mod source;
pub mod traits;
pub mod xpath;

pub use replay::{ReplayFactory, ReplayScript, ReplaySession};
pub use traits::{
    Action, AutomationSession, ControlHandle, LocatorCandidate, NodeText, ProbeError, Rect,
    SessionFactory, Strategy,
};
