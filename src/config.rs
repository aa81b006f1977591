//! Gate configuration.
//!
//! A gate is described by a window length (one [`TimeUnit`]) and the number of
//! requests admitted per window. Both must be positive; anything else is rejected
//! before a limiter or its reset task exists.

use serde::Deserialize;
use std::time::Duration;

/// Endpoint used when none is configured explicitly.
pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Granularity of the admission window. The window is exactly one unit long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of a single unit.
    pub fn duration(self) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(1),
            TimeUnit::Microseconds => Duration::from_micros(1),
            TimeUnit::Milliseconds => Duration::from_millis(1),
            TimeUnit::Seconds => Duration::from_secs(1),
            TimeUnit::Minutes => Duration::from_secs(60),
            TimeUnit::Hours => Duration::from_secs(60 * 60),
            TimeUnit::Days => Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl From<TimeUnit> for Duration {
    fn from(unit: TimeUnit) -> Self {
        unit.duration()
    }
}

/// Errors produced while validating a [`GateConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `request_limit` must be > 0.
    #[error("request_limit must be > 0 (got {0})")]
    ZeroRequestLimit(u32),
    /// The window must be at least one millisecond long.
    #[error("window must be at least 1ms (got {0:?})")]
    ZeroWindow(Duration),
    /// The submission endpoint must not be blank.
    #[error("endpoint must not be empty")]
    EmptyEndpoint,
}

/// Validated configuration for a document gate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawGateConfig")]
pub struct GateConfig {
    window: Duration,
    request_limit: u32,
    endpoint: String,
    acquire_timeout: Option<Duration>,
}

impl GateConfig {
    /// Mirror of the classic `(time unit, request limit)` constructor.
    ///
    /// ```
    /// use docgate::{GateConfig, TimeUnit};
    /// let cfg = GateConfig::new(TimeUnit::Minutes, 10).unwrap();
    /// assert_eq!(cfg.request_limit(), 10);
    /// assert!(GateConfig::new(TimeUnit::Seconds, 0).is_err());
    /// ```
    pub fn new(unit: TimeUnit, request_limit: u32) -> Result<Self, ConfigError> {
        Self::builder().time_unit(unit).request_limit(request_limit).build()
    }

    /// Start a builder with defaults (1 request per second, default endpoint).
    pub fn builder() -> GateConfigBuilder {
        GateConfigBuilder::new()
    }

    /// Length of one admission window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Permits available per window.
    pub fn request_limit(&self) -> u32 {
        self.request_limit
    }

    /// Document creation endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upper bound on how long `submit` waits for a permit, if any.
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout
    }

    /// Same config with the limiter-facing values replaced.
    pub(crate) fn with_limits(mut self, window: Duration, request_limit: u32) -> Self {
        self.window = window;
        self.request_limit = request_limit;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_limit == 0 {
            return Err(ConfigError::ZeroRequestLimit(self.request_limit));
        }
        // Window bookkeeping runs at millisecond resolution.
        if self.window < Duration::from_millis(1) {
            return Err(ConfigError::ZeroWindow(self.window));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        Ok(())
    }
}

/// Builder for [`GateConfig`].
#[derive(Debug, Clone)]
pub struct GateConfigBuilder {
    window: Duration,
    request_limit: u32,
    endpoint: String,
    acquire_timeout: Option<Duration>,
}

impl GateConfigBuilder {
    /// Create a builder with defaults.
    pub fn new() -> Self {
        Self {
            window: TimeUnit::Seconds.duration(),
            request_limit: 1,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            acquire_timeout: None,
        }
    }

    /// Window length of one `unit`.
    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.window = unit.duration();
        self
    }

    /// Arbitrary window length. Must be >= 1ms.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Permits per window. Must be > 0.
    pub fn request_limit(mut self, limit: u32) -> Self {
        self.request_limit = limit;
        self
    }

    /// Override the document creation endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Bound the wait for a permit on every `submit`.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Build the config, validating inputs.
    pub fn build(self) -> Result<GateConfig, ConfigError> {
        let cfg = GateConfig {
            window: self.window,
            request_limit: self.request_limit,
            endpoint: self.endpoint,
            acquire_timeout: self.acquire_timeout,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

impl Default for GateConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct RawGateConfig {
    #[serde(default)]
    time_unit: Option<TimeUnit>,
    #[serde(default)]
    window_ms: Option<u64>,
    request_limit: u32,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    acquire_timeout_ms: Option<u64>,
}

impl TryFrom<RawGateConfig> for GateConfig {
    type Error = ConfigError;

    fn try_from(raw: RawGateConfig) -> Result<Self, Self::Error> {
        let mut builder = GateConfig::builder().request_limit(raw.request_limit);
        // An explicit millisecond window wins over a unit.
        if let Some(unit) = raw.time_unit {
            builder = builder.time_unit(unit);
        }
        if let Some(ms) = raw.window_ms {
            builder = builder.window(Duration::from_millis(ms));
        }
        if let Some(endpoint) = raw.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(ms) = raw.acquire_timeout_ms {
            builder = builder.acquire_timeout(Duration::from_millis(ms));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_unit_is_one_unit_long() {
        assert_eq!(TimeUnit::Milliseconds.duration(), Duration::from_millis(1));
        assert_eq!(TimeUnit::Minutes.duration(), Duration::from_secs(60));
        assert_eq!(Duration::from(TimeUnit::Days), Duration::from_secs(86_400));
    }

    #[test]
    fn rejects_zero_request_limit() {
        let err = GateConfig::new(TimeUnit::Seconds, 0).expect_err("zero limit should be invalid");
        assert_eq!(err, ConfigError::ZeroRequestLimit(0));
    }

    #[test]
    fn rejects_sub_millisecond_window() {
        let err = GateConfig::new(TimeUnit::Microseconds, 5)
            .expect_err("sub-millisecond window should be invalid");
        assert!(matches!(err, ConfigError::ZeroWindow(_)));

        let err = GateConfig::builder().window(Duration::ZERO).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroWindow(Duration::ZERO));
    }

    #[test]
    fn rejects_blank_endpoint() {
        let err = GateConfig::builder().endpoint("  ").build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyEndpoint);
    }

    #[test]
    fn builder_defaults() {
        let cfg = GateConfig::builder().build().unwrap();
        assert_eq!(cfg.window(), Duration::from_secs(1));
        assert_eq!(cfg.request_limit(), 1);
        assert_eq!(cfg.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(cfg.acquire_timeout(), None);
    }

    #[test]
    fn deserializes_and_validates() {
        let cfg: GateConfig = serde_json::from_str(
            r#"{"time_unit":"minutes","request_limit":10,"acquire_timeout_ms":250}"#,
        )
        .unwrap();
        assert_eq!(cfg.window(), Duration::from_secs(60));
        assert_eq!(cfg.request_limit(), 10);
        assert_eq!(cfg.acquire_timeout(), Some(Duration::from_millis(250)));

        let cfg: GateConfig =
            serde_json::from_str(r#"{"window_ms":1500,"request_limit":3}"#).unwrap();
        assert_eq!(cfg.window(), Duration::from_millis(1500));

        let err = serde_json::from_str::<GateConfig>(r#"{"request_limit":0}"#).unwrap_err();
        assert!(err.to_string().contains("request_limit must be > 0"));
    }
}
