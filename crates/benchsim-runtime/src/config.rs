//! Bench timing configuration loading.

#![allow(missing_docs)]

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;
use crate::time::millis_of;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchConfig {
    pub boot: BootTiming,
    pub status: StatusTiming,
    pub cases: CaseTiming,
}

/// Boot and reset sequence timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootTiming {
    /// Power indicator on -> init flash starts.
    pub init_delay: Duration,
    pub init_flash: Duration,
    pub init_flash_period: Duration,
    pub reset_flash: Duration,
    pub reset_flash_period: Duration,
    /// Reset -> power-on sequence restarts.
    pub reset_restart: Duration,
}

impl Default for BootTiming {
    fn default() -> Self {
        Self {
            init_delay: Duration::from_millis(500),
            init_flash: Duration::from_millis(2_000),
            init_flash_period: Duration::from_millis(200),
            reset_flash: Duration::from_millis(1_000),
            reset_flash_period: Duration::from_millis(100),
            reset_restart: Duration::from_millis(1_100),
        }
    }
}

/// Status and cue animation timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTiming {
    pub run_pulse: Duration,
    pub idle_pulse: Duration,
    /// Alternating pattern when a run starts.
    pub progress_period: Duration,
    /// Alternating pattern when a case resumes it.
    pub resume_progress_period: Duration,
    pub fail_blink: Duration,
    pub input_flash_period: Duration,
    pub input_flash: Duration,
}

impl Default for StatusTiming {
    fn default() -> Self {
        Self {
            run_pulse: Duration::from_millis(500),
            idle_pulse: Duration::from_millis(1_500),
            progress_period: Duration::from_millis(300),
            resume_progress_period: Duration::from_millis(500),
            fail_blink: Duration::from_millis(500),
            input_flash_period: Duration::from_millis(100),
            input_flash: Duration::from_millis(200),
        }
    }
}

/// Test case windows and thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseTiming {
    pub window: Duration,
    /// Maximum gap between fast presses.
    pub fast_press: Duration,
    pub unlock_window: Duration,
    pub recovery_window: Duration,
    pub unlock_tick: Duration,
    pub max_attempts: u32,
}

impl Default for CaseTiming {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(5_000),
            fast_press: Duration::from_millis(200),
            unlock_window: Duration::from_millis(10_000),
            recovery_window: Duration::from_millis(5_000),
            unlock_tick: Duration::from_millis(100),
            max_attempts: 3,
        }
    }
}

impl BenchConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            BenchError::InvalidConfig(format!("{}: {err}", path.display()).into())
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, BenchError> {
        let raw: BenchToml = toml::from_str(text)
            .map_err(|err| BenchError::InvalidConfig(format!("bench.toml: {err}").into()))?;
        raw.into_config()
    }

    /// Render the effective configuration in the same TOML layout it loads.
    pub fn to_toml_string(&self) -> Result<String, BenchError> {
        toml::to_string(&BenchToml::from(self))
            .map_err(|err| BenchError::InvalidConfig(format!("bench.toml: {err}").into()))
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
struct BenchToml {
    boot: BootToml,
    status: StatusToml,
    cases: CasesToml,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
struct BootToml {
    init_delay_ms: u64,
    init_flash_ms: u64,
    init_flash_period_ms: u64,
    reset_flash_ms: u64,
    reset_flash_period_ms: u64,
    reset_restart_ms: u64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
struct StatusToml {
    run_pulse_ms: u64,
    idle_pulse_ms: u64,
    progress_period_ms: u64,
    resume_progress_period_ms: u64,
    fail_blink_ms: u64,
    input_flash_period_ms: u64,
    input_flash_ms: u64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
struct CasesToml {
    window_ms: u64,
    fast_press_ms: u64,
    unlock_window_ms: u64,
    recovery_window_ms: u64,
    unlock_tick_ms: u64,
    max_attempts: u32,
}

impl Default for BenchToml {
    fn default() -> Self {
        Self::from(&BenchConfig::default())
    }
}

impl Default for BootToml {
    fn default() -> Self {
        Self::from(&BootTiming::default())
    }
}

impl Default for StatusToml {
    fn default() -> Self {
        Self::from(&StatusTiming::default())
    }
}

impl Default for CasesToml {
    fn default() -> Self {
        Self::from(&CaseTiming::default())
    }
}

impl From<&BenchConfig> for BenchToml {
    fn from(config: &BenchConfig) -> Self {
        Self {
            boot: BootToml::from(&config.boot),
            status: StatusToml::from(&config.status),
            cases: CasesToml::from(&config.cases),
        }
    }
}

impl From<&BootTiming> for BootToml {
    fn from(timing: &BootTiming) -> Self {
        Self {
            init_delay_ms: millis_of(timing.init_delay),
            init_flash_ms: millis_of(timing.init_flash),
            init_flash_period_ms: millis_of(timing.init_flash_period),
            reset_flash_ms: millis_of(timing.reset_flash),
            reset_flash_period_ms: millis_of(timing.reset_flash_period),
            reset_restart_ms: millis_of(timing.reset_restart),
        }
    }
}

impl From<&StatusTiming> for StatusToml {
    fn from(timing: &StatusTiming) -> Self {
        Self {
            run_pulse_ms: millis_of(timing.run_pulse),
            idle_pulse_ms: millis_of(timing.idle_pulse),
            progress_period_ms: millis_of(timing.progress_period),
            resume_progress_period_ms: millis_of(timing.resume_progress_period),
            fail_blink_ms: millis_of(timing.fail_blink),
            input_flash_period_ms: millis_of(timing.input_flash_period),
            input_flash_ms: millis_of(timing.input_flash),
        }
    }
}

impl From<&CaseTiming> for CasesToml {
    fn from(timing: &CaseTiming) -> Self {
        Self {
            window_ms: millis_of(timing.window),
            fast_press_ms: millis_of(timing.fast_press),
            unlock_window_ms: millis_of(timing.unlock_window),
            recovery_window_ms: millis_of(timing.recovery_window),
            unlock_tick_ms: millis_of(timing.unlock_tick),
            max_attempts: timing.max_attempts,
        }
    }
}

impl BenchToml {
    fn into_config(self) -> Result<BenchConfig, BenchError> {
        let boot = BootTiming {
            init_delay: delay(self.boot.init_delay_ms),
            init_flash: delay(self.boot.init_flash_ms),
            init_flash_period: period("boot.init_flash_period_ms", self.boot.init_flash_period_ms)?,
            reset_flash: delay(self.boot.reset_flash_ms),
            reset_flash_period: period(
                "boot.reset_flash_period_ms",
                self.boot.reset_flash_period_ms,
            )?,
            reset_restart: delay(self.boot.reset_restart_ms),
        };
        let status = StatusTiming {
            run_pulse: period("status.run_pulse_ms", self.status.run_pulse_ms)?,
            idle_pulse: period("status.idle_pulse_ms", self.status.idle_pulse_ms)?,
            progress_period: period("status.progress_period_ms", self.status.progress_period_ms)?,
            resume_progress_period: period(
                "status.resume_progress_period_ms",
                self.status.resume_progress_period_ms,
            )?,
            fail_blink: period("status.fail_blink_ms", self.status.fail_blink_ms)?,
            input_flash_period: period(
                "status.input_flash_period_ms",
                self.status.input_flash_period_ms,
            )?,
            input_flash: delay(self.status.input_flash_ms),
        };
        if self.cases.max_attempts == 0 {
            return Err(BenchError::InvalidConfig(
                "cases.max_attempts must be at least 1".into(),
            ));
        }
        let cases = CaseTiming {
            window: period("cases.window_ms", self.cases.window_ms)?,
            fast_press: period("cases.fast_press_ms", self.cases.fast_press_ms)?,
            unlock_window: period("cases.unlock_window_ms", self.cases.unlock_window_ms)?,
            recovery_window: period("cases.recovery_window_ms", self.cases.recovery_window_ms)?,
            unlock_tick: period("cases.unlock_tick_ms", self.cases.unlock_tick_ms)?,
            max_attempts: self.cases.max_attempts,
        };
        Ok(BenchConfig {
            boot,
            status,
            cases,
        })
    }
}

fn delay(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

fn period(name: &str, ms: u64) -> Result<Duration, BenchError> {
    if ms == 0 {
        return Err(BenchError::InvalidConfig(
            format!("{name} must be greater than zero").into(),
        ));
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = BenchConfig::from_toml_str("").unwrap();
        assert_eq!(config, BenchConfig::default());
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config = BenchConfig::from_toml_str(
            r#"
[status]
idle_pulse_ms = 900

[cases]
window_ms = 3000
"#,
        )
        .unwrap();
        assert_eq!(config.status.idle_pulse, Duration::from_millis(900));
        assert_eq!(config.status.run_pulse, Duration::from_millis(500));
        assert_eq!(config.cases.window, Duration::from_millis(3_000));
        assert_eq!(config.boot, BootTiming::default());
    }

    #[test]
    fn unlock_window_defaults_to_ten_seconds() {
        let config = BenchConfig::default();
        assert_eq!(config.cases.unlock_window, Duration::from_millis(10_000));
        assert!(config
            .to_toml_string()
            .unwrap()
            .contains("unlock_window_ms = 10000"));
    }

    #[test]
    fn zero_period_rejected() {
        let err = BenchConfig::from_toml_str("[status]\nrun_pulse_ms = 0\n").unwrap_err();
        assert_eq!(
            err,
            BenchError::InvalidConfig("status.run_pulse_ms must be greater than zero".into())
        );
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(BenchConfig::from_toml_str("[boot]\nwarp_speed = 9\n").is_err());
    }

    #[test]
    fn rendered_config_loads_back() {
        let mut config = BenchConfig::default();
        config.cases.max_attempts = 5;
        let text = config.to_toml_string().unwrap();
        assert_eq!(BenchConfig::from_toml_str(&text).unwrap(), config);
    }
}
