//! Scripted press sequences with indicator expectations.
//!
//! ```toml
//! name = "tc1 pass"
//! until_ms = 9000
//!
//! [[step]]
//! at_ms = 0
//! press = "power"
//!
//! [[expect]]
//! at_ms = 8600
//! indicator = "tc1.pass"
//! color = "lime"
//! ```
//!
//! At each instant, presses are applied before expectations are checked.

#![allow(missing_docs)]

use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::bench::{Bench, BenchSnapshot};
use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::events::BenchEvent;
use crate::input::Channel;
use crate::panel::{Color, IndicatorId};
use crate::time::SimTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub at: SimTime,
    pub press: Channel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub at: SimTime,
    pub indicator: IndicatorId,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: SmolStr,
    pub steps: Vec<Step>,
    pub expectations: Vec<Expectation>,
    pub until: SimTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectationFailure {
    pub at: SimTime,
    pub indicator: IndicatorId,
    pub expected: Color,
    pub actual: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub name: SmolStr,
    pub checked: usize,
    pub failures: Vec<ExpectationFailure>,
    pub events: Vec<BenchEvent>,
    pub snapshot: BenchSnapshot,
}

impl ScenarioReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioToml {
    name: Option<String>,
    until_ms: Option<u64>,
    #[serde(default)]
    step: Vec<StepToml>,
    #[serde(default)]
    expect: Vec<ExpectToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepToml {
    at_ms: u64,
    press: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpectToml {
    at_ms: u64,
    indicator: String,
    color: String,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            BenchError::InvalidScenario(format!("{}: {err}", path.display()).into())
        })?;
        let fallback = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&text, &fallback)
    }

    /// Parse a scenario; `fallback_name` is used when the file has no `name`.
    pub fn parse(text: &str, fallback_name: &str) -> Result<Self, BenchError> {
        let raw: ScenarioToml = toml::from_str(text)
            .map_err(|err| BenchError::InvalidScenario(err.to_string().into()))?;
        let mut steps = raw
            .step
            .into_iter()
            .enumerate()
            .map(|(index, step)| {
                let press = step
                    .press
                    .parse::<Channel>()
                    .map_err(|err| invalid("step", index, &err))?;
                Ok(Step {
                    at: SimTime::from_millis(step.at_ms),
                    press,
                })
            })
            .collect::<Result<Vec<_>, BenchError>>()?;
        let mut expectations = raw
            .expect
            .into_iter()
            .enumerate()
            .map(|(index, expect)| {
                let indicator = expect
                    .indicator
                    .parse::<IndicatorId>()
                    .map_err(|err| invalid("expect", index, &err))?;
                let color = expect
                    .color
                    .parse::<Color>()
                    .map_err(|err| invalid("expect", index, &err))?;
                Ok(Expectation {
                    at: SimTime::from_millis(expect.at_ms),
                    indicator,
                    color,
                })
            })
            .collect::<Result<Vec<_>, BenchError>>()?;
        steps.sort_by_key(|step| step.at);
        expectations.sort_by_key(|expect| expect.at);

        let last = steps
            .iter()
            .map(|step| step.at)
            .chain(expectations.iter().map(|expect| expect.at))
            .max()
            .unwrap_or(SimTime::ZERO);
        let until = raw.until_ms.map_or(last, SimTime::from_millis);
        if until < last {
            return Err(BenchError::InvalidScenario(
                format!("until_ms {} is before the last entry at {last}", until.as_millis()).into(),
            ));
        }
        Ok(Self {
            name: raw.name.as_deref().unwrap_or(fallback_name).into(),
            steps,
            expectations,
            until,
        })
    }

    /// Run on a fresh bench.
    #[must_use]
    pub fn run(&self, config: &BenchConfig) -> ScenarioReport {
        let mut bench = Bench::new(config.clone());
        self.run_on(&mut bench)
    }

    /// Run on `bench`; times are offsets from its current time.
    pub fn run_on(&self, bench: &mut Bench) -> ScenarioReport {
        let origin = bench.now();
        let at = |offset: SimTime| origin.after(std::time::Duration::from_millis(offset.as_millis()));
        let mut steps = self.steps.iter().peekable();
        let mut expectations = self.expectations.iter().peekable();
        let mut failures = Vec::new();
        let mut checked = 0;

        loop {
            let next_step = steps.peek().map(|step| step.at);
            let next_expect = expectations.peek().map(|expect| expect.at);
            let Some(instant) = next_step.into_iter().chain(next_expect).min() else {
                break;
            };
            bench.advance_to(at(instant));
            while let Some(step) = steps.next_if(|step| step.at == instant) {
                bench.press(step.press);
            }
            while let Some(expect) = expectations.next_if(|expect| expect.at == instant) {
                checked += 1;
                let actual = bench.color(expect.indicator).unwrap_or_default();
                if actual != expect.color {
                    debug!(
                        indicator = %expect.indicator,
                        "expected {} at {}, found {actual}",
                        expect.color,
                        expect.at
                    );
                    failures.push(ExpectationFailure {
                        at: expect.at,
                        indicator: expect.indicator,
                        expected: expect.color,
                        actual,
                    });
                }
            }
        }
        bench.advance_to(at(self.until));

        ScenarioReport {
            name: self.name.clone(),
            checked,
            failures,
            events: bench.drain_events(),
            snapshot: bench.snapshot(),
        }
    }
}

fn invalid(table: &str, index: usize, err: &BenchError) -> BenchError {
    BenchError::InvalidScenario(format!("{table} {}: {err}", index + 1).into())
}
