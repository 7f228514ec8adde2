//! Panel layout, indicator identifiers, and indicator state.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use smol_str::SmolStr;

use crate::error::BenchError;
use crate::time::SimTime;

/// Number of pass/fail indicator pairs on the panel.
pub const SLOT_COUNT: usize = 5;

const HISTORY_LIMIT: usize = 4096;

/// Indicator colors. `White` is the off state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Lime,
    #[default]
    White,
}

impl Color {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Lime => "lime",
            Self::White => "white",
        }
    }

    #[must_use]
    pub fn is_lit(self) -> bool {
        self != Self::White
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = BenchError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "lime" | "green" => Ok(Self::Lime),
            "white" | "off" => Ok(Self::White),
            _ => Err(BenchError::UnknownColor(SmolStr::new(text))),
        }
    }
}

/// Status indicators along the top of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusLed {
    Power,
    Init,
    Ready,
    Run,
    Idle,
}

impl StatusLed {
    pub const ALL: [Self; 5] = [Self::Power, Self::Init, Self::Ready, Self::Run, Self::Idle];

    fn index(self) -> usize {
        match self {
            Self::Power => 0,
            Self::Init => 1,
            Self::Ready => 2,
            Self::Run => 3,
            Self::Idle => 4,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Init => "init",
            Self::Ready => "ready",
            Self::Run => "run",
            Self::Idle => "idle",
        }
    }
}

/// Reference to a single indicator on the panel.
///
/// Slots are zero-based; the rendered name is one-based (`tc1.pass`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorId {
    Status(StatusLed),
    Pass(usize),
    Fail(usize),
}

impl IndicatorId {
    /// Every valid indicator, status first, then pass/fail pairs by slot.
    pub fn all() -> impl Iterator<Item = IndicatorId> {
        StatusLed::ALL
            .into_iter()
            .map(IndicatorId::Status)
            .chain((0..SLOT_COUNT).flat_map(|slot| [Self::Pass(slot), Self::Fail(slot)]))
    }

    /// Whether the reference points at an indicator that exists.
    #[must_use]
    pub fn is_valid(self) -> bool {
        match self {
            Self::Status(_) => true,
            Self::Pass(slot) | Self::Fail(slot) => slot < SLOT_COUNT,
        }
    }
}

impl From<StatusLed> for IndicatorId {
    fn from(value: StatusLed) -> Self {
        Self::Status(value)
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(led) => f.write_str(led.as_str()),
            Self::Pass(slot) => write!(f, "tc{}.pass", slot + 1),
            Self::Fail(slot) => write!(f, "tc{}.fail", slot + 1),
        }
    }
}

impl Serialize for IndicatorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for IndicatorId {
    type Err = BenchError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let unknown = || BenchError::UnknownIndicator(SmolStr::new(text));
        let name = text.trim().to_ascii_lowercase();
        if let Some(led) = StatusLed::ALL.into_iter().find(|led| led.as_str() == name) {
            return Ok(Self::Status(led));
        }
        let rest = name.strip_prefix("tc").ok_or_else(unknown)?;
        let (number, role) = rest.split_once('.').ok_or_else(unknown)?;
        let slot = number
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .filter(|slot| *slot < SLOT_COUNT)
            .ok_or_else(unknown)?;
        match role {
            "pass" => Ok(Self::Pass(slot)),
            "fail" => Ok(Self::Fail(slot)),
            _ => Err(unknown()),
        }
    }
}

/// Rendering boundary for indicators.
///
/// Implementations draw the panel; the bench never reads back from them.
pub trait Indicators: Send {
    /// Light `id` in `color` (`Color::White` turns it off).
    fn set_color(&mut self, id: IndicatorId, color: Color);

    /// Turn `id` off.
    fn set_off(&mut self, id: IndicatorId) {
        self.set_color(id, Color::White);
    }
}

/// One recorded color change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub at: SimTime,
    pub indicator: IndicatorId,
    pub color: Color,
}

/// Current color of every indicator plus a bounded transition history.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    status: [Color; 5],
    pass: [Color; SLOT_COUNT],
    fail: [Color; SLOT_COUNT],
    history: VecDeque<Transition>,
}

impl PanelState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current color, or `None` for an indicator that does not exist.
    #[must_use]
    pub fn color(&self, id: IndicatorId) -> Option<Color> {
        match id {
            IndicatorId::Status(led) => Some(self.status[led.index()]),
            IndicatorId::Pass(slot) => self.pass.get(slot).copied(),
            IndicatorId::Fail(slot) => self.fail.get(slot).copied(),
        }
    }

    #[must_use]
    pub fn is_lit(&self, id: IndicatorId) -> bool {
        self.color(id).is_some_and(Color::is_lit)
    }

    /// Set a color. Returns `true` if the indicator exists and changed.
    pub(crate) fn apply(&mut self, at: SimTime, id: IndicatorId, color: Color) -> bool {
        let slot = match id {
            IndicatorId::Status(led) => Some(&mut self.status[led.index()]),
            IndicatorId::Pass(slot) => self.pass.get_mut(slot),
            IndicatorId::Fail(slot) => self.fail.get_mut(slot),
        };
        let Some(current) = slot else {
            return false;
        };
        if *current == color {
            return false;
        }
        *current = color;
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(Transition {
            at,
            indicator: id,
            color,
        });
        true
    }

    /// Recorded transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.history.iter()
    }

    /// Number of times `id` switched on at or after `since`.
    #[must_use]
    pub fn lit_count_since(&self, id: IndicatorId, since: SimTime) -> usize {
        self.history
            .iter()
            .filter(|t| t.indicator == id && t.at >= since && t.color.is_lit())
            .count()
    }

    /// `(indicator, color)` for every indicator in layout order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(IndicatorId, Color)> {
        IndicatorId::all()
            .filter_map(|id| self.color(id).map(|color| (id, color)))
            .collect()
    }

    /// Whether every pass/fail indicator is off.
    #[must_use]
    pub fn test_indicators_off(&self) -> bool {
        self.pass.iter().chain(self.fail.iter()).all(|c| !c.is_lit())
    }
}
