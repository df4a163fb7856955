use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Content-sniffing heuristics for error surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHeuristics {
    /// Case-insensitive substrings that mark a text as error-like
    pub keywords: Vec<String>,

    /// Texts shorter than this containing `!` are error-like too
    pub short_text_threshold: usize,

    /// Static texts read by the broad scan
    pub static_scan_limit: usize,

    /// Container/static nodes read by the container tier
    pub container_scan_limit: usize,
}

impl Default for ErrorHeuristics {
    fn default() -> Self {
        Self {
            keywords: [
                "invalid",
                "error",
                "do not match",
                "epic sadface",
                "username and password",
                "required",
                "locked",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            short_text_threshold: 60,
            static_scan_limit: 60,
            container_scan_limit: 40,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target platform (`ios` or `android`)
    pub platform: String,

    pub device_name: Option<String>,

    /// App path or bundle id handed to the session
    pub app: Option<String>,

    /// Per-candidate wait during resolution (ms)
    pub probe_timeout_ms: u64,

    /// Extra wait for the first candidate once every candidate failed (ms)
    pub last_chance_ms: u64,

    /// Delay between polling samples (ms)
    pub poll_interval_ms: u64,

    /// Default deadline for error-text polling (ms)
    pub error_wait_ms: u64,

    /// Deadline for the catalog heading to appear (ms)
    pub products_timeout_ms: u64,

    /// Wait for a screen to follow a navigation tap (ms)
    pub transition_timeout_ms: u64,

    /// Wait for an exact sort option to show up (ms)
    pub option_wait_ms: u64,

    /// Continue with the next scenario after a failure
    pub continue_on_failure: bool,

    pub error_heuristics: ErrorHeuristics,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: "ios".to_string(),
            device_name: None,
            app: None,
            probe_timeout_ms: 1000,
            last_chance_ms: 3000,
            poll_interval_ms: 350,
            error_wait_ms: 4000,
            products_timeout_ms: 10000,
            transition_timeout_ms: 6000,
            option_wait_ms: 3000,
            continue_on_failure: true,
            error_heuristics: ErrorHeuristics::default(),
        }
    }
}

impl Config {
    /// Load from a YAML file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Patch from `SWAG_*` variables of the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Patch from an arbitrary variable lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(platform) = lookup("SWAG_PLATFORM") {
            let platform = platform.to_lowercase();
            if platform != "ios" && platform != "android" {
                anyhow::bail!("SWAG_PLATFORM must be 'ios' or 'android', got '{}'", platform);
            }
            self.platform = platform;
        }
        if let Some(device) = lookup("SWAG_DEVICE") {
            self.device_name = Some(device);
        }
        if let Some(app) = lookup("SWAG_APP") {
            self.app = Some(app);
        }
        if let Some(ms) = lookup("SWAG_PROBE_MS") {
            self.probe_timeout_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("SWAG_PROBE_MS is not a number: '{}'", ms))?;
        }
        Ok(self)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn last_chance(&self) -> Duration {
        Duration::from_millis(self.last_chance_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_wait(&self) -> Duration {
        Duration::from_millis(self.error_wait_ms)
    }

    pub fn products_timeout(&self) -> Duration {
        Duration::from_millis(self.products_timeout_ms)
    }

    pub fn transition_timeout(&self) -> Duration {
        Duration::from_millis(self.transition_timeout_ms)
    }

    pub fn option_wait(&self) -> Duration {
        Duration::from_millis(self.option_wait_ms)
    }

    /// W3C capability object for a session factory
    pub fn capabilities(&self) -> serde_json::Value {
        let automation = if self.platform == "android" {
            "UiAutomator2"
        } else {
            "XCUITest"
        };
        let mut caps = serde_json::json!({
            "platformName": if self.platform == "android" { "Android" } else { "iOS" },
            "appium:automationName": automation,
            "appium:newCommandTimeout": 120,
        });
        if let Some(device) = &self.device_name {
            caps["appium:deviceName"] = serde_json::Value::String(device.clone());
        }
        if let Some(app) = &self.app {
            caps["appium:app"] = serde_json::Value::String(app.clone());
        }
        caps
    }
}
