use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Locator strategy understood by the automation protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// `name` on iOS, `content-desc` on Android
    AccessibilityId,
    /// Resource id (Android) or identifier
    Id,
    /// Element name attribute
    Name,
    /// Element type / class
    ClassName,
    /// NSPredicate string (XCUITest)
    IosPredicate,
    /// XPath 1.0 expression
    XPath,
    /// `new UiSelector()...` chain (UiAutomator2)
    AndroidUiAutomator,
}

impl Strategy {
    /// Wire name used by the W3C/Appium `using` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::AccessibilityId => "accessibility id",
            Strategy::Id => "id",
            Strategy::Name => "name",
            Strategy::ClassName => "class name",
            Strategy::IosPredicate => "-ios predicate string",
            Strategy::XPath => "xpath",
            Strategy::AndroidUiAutomator => "-android uiautomator",
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accessibility id" | "accessibility-id" | "accessibility_id" | "aid" => {
                Ok(Strategy::AccessibilityId)
            }
            "id" => Ok(Strategy::Id),
            "name" => Ok(Strategy::Name),
            "class name" | "class" | "class_name" => Ok(Strategy::ClassName),
            "-ios predicate string" | "predicate" | "ios_predicate" => Ok(Strategy::IosPredicate),
            "xpath" => Ok(Strategy::XPath),
            "-android uiautomator" | "uiautomator" | "android_uiautomator" => {
                Ok(Strategy::AndroidUiAutomator)
            }
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked way of finding a logical control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorCandidate {
    pub strategy: Strategy,
    pub expression: String,
}

impl LocatorCandidate {
    pub fn new(strategy: Strategy, expression: impl Into<String>) -> Self {
        Self {
            strategy,
            expression: expression.into(),
        }
    }

    pub fn by_accessibility_id(id: impl Into<String>) -> Self {
        Self::new(Strategy::AccessibilityId, id)
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new(Strategy::Id, id)
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new(Strategy::Name, name)
    }

    pub fn by_class(class: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, class)
    }

    pub fn by_predicate(predicate: impl Into<String>) -> Self {
        Self::new(Strategy::IosPredicate, predicate)
    }

    pub fn by_xpath(xpath: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, xpath)
    }

    pub fn by_uiautomator(selector: impl Into<String>) -> Self {
        Self::new(Strategy::AndroidUiAutomator, selector)
    }
}

impl fmt::Display for LocatorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.expression)
    }
}

/// Opaque element reference issued by a session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlHandle(pub String);

impl ControlHandle {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element geometry in screen points
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Get the center point of the rect
    pub fn center(&self) -> (i32, i32) {
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        (cx as i32, cy as i32)
    }

    /// Check if this rect contains another rect entirely
    pub fn contains(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && (self.x + self.width) >= (other.x + other.width)
            && (self.y + self.height) >= (other.y + other.height)
    }
}

/// Raw displayed-value attributes of a node, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeText {
    pub text: Option<String>,
    pub label: Option<String>,
    pub value: Option<String>,
}

/// Protocol-level action on a session
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Native element click
    Click(ControlHandle),
    /// Clear an editable element
    Clear(ControlHandle),
    /// Send a literal character sequence to an element
    SendKeys(ControlHandle, String),
    /// `mobile: tap` addressed by element
    TapElement(ControlHandle),
    /// `mobile: tap` addressed by coordinate
    TapPoint { x: i32, y: i32 },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Click(_) => "click",
            Action::Clear(_) => "clear",
            Action::SendKeys(..) => "sendKeys",
            Action::TapElement(_) => "tapElement",
            Action::TapPoint { .. } => "tapPoint",
        }
    }

    pub fn target(&self) -> Option<&ControlHandle> {
        match self {
            Action::Click(h) | Action::Clear(h) | Action::TapElement(h) => Some(h),
            Action::SendKeys(h, _) => Some(h),
            Action::TapPoint { .. } => None,
        }
    }
}

/// Failure of a single protocol call
///
/// Every variant is expected control flow inside the engine: it drives the
/// next fallback tier and never reaches the façade caller directly.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    #[error("no element matched {strategy} '{expression}'")]
    NotFound {
        strategy: Strategy,
        expression: String,
    },

    #[error("{action} rejected: {reason}")]
    ActionFailed { action: &'static str, reason: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("stale element handle {0}")]
    StaleElement(String),

    #[error("invalid {strategy} selector '{expression}': {reason}")]
    InvalidSelector {
        strategy: Strategy,
        expression: String,
        reason: String,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Protocol session interface
///
/// One session drives one app instance. Callers issue a single request at a
/// time; implementations do not need to support interleaved calls.
#[async_trait]
pub trait AutomationSession: Send + Sync {
    /// Session identifier (used for logging and artifact names)
    fn session_id(&self) -> &str;

    /// Wait up to `timeout` for one element matching the locator
    async fn find_one(
        &self,
        strategy: Strategy,
        expression: &str,
        timeout: Duration,
    ) -> Result<ControlHandle, ProbeError>;

    /// All elements matching the locator in the current snapshot (no waiting)
    async fn find_all(
        &self,
        strategy: Strategy,
        expression: &str,
    ) -> Result<Vec<ControlHandle>, ProbeError>;

    /// All elements matching the locator inside `parent` (no waiting)
    async fn find_all_within(
        &self,
        parent: &ControlHandle,
        strategy: Strategy,
        expression: &str,
    ) -> Result<Vec<ControlHandle>, ProbeError>;

    /// Perform an action
    async fn act(&self, action: Action) -> Result<(), ProbeError>;

    /// Read text, label and value attributes of an element
    async fn node_text(&self, handle: &ControlHandle) -> Result<NodeText, ProbeError>;

    /// Read element geometry
    async fn rect(&self, handle: &ControlHandle) -> Result<Rect, ProbeError>;

    /// Current UI hierarchy as page-source text
    async fn snapshot_tree(&self) -> Result<String, ProbeError>;

    /// PNG screenshot bytes (diagnostics only)
    async fn screenshot(&self) -> Result<Vec<u8>, ProbeError>;
}

/// Opens one independent session per scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, scenario: &str) -> anyhow::Result<std::sync::Arc<dyn AutomationSession>>;
}
