use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Severity bucket a scored value can fall into.
///
/// Precedence is strict: `Red > Amber > Gray > Green`. Green marks an
/// explicitly matched no-issue tier and never contributes to flag counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RagColor {
    Red,
    Amber,
    Gray,
    Green,
}

impl RagColor {
    /// Numeric precedence used to order colors; higher wins.
    pub fn precedence(self) -> u8 {
        match self {
            RagColor::Red => 3,
            RagColor::Amber => 2,
            RagColor::Gray => 1,
            RagColor::Green => 0,
        }
    }

    /// Whether this color contributes a flag unit to badge counts.
    pub fn is_flagged(self) -> bool {
        !matches!(self, RagColor::Green)
    }
}

/// Per-result flag counters, mutually near-exclusive after collapsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Flags {
    pub red: i64,
    pub amber: i64,
    pub gray: i64,
}

impl Flags {
    pub fn is_empty(&self) -> bool {
        self.red == 0 && self.amber == 0 && self.gray == 0
    }

    /// The highest-precedence color with a non-zero count.
    pub fn most_severe(&self) -> Option<RagColor> {
        if self.red > 0 {
            Some(RagColor::Red)
        } else if self.amber > 0 {
            Some(RagColor::Amber)
        } else if self.gray > 0 {
            Some(RagColor::Gray)
        } else {
            None
        }
    }

    pub fn count(&self, color: RagColor) -> i64 {
        match color {
            RagColor::Red => self.red,
            RagColor::Amber => self.amber,
            RagColor::Gray => self.gray,
            RagColor::Green => 0,
        }
    }

    pub fn increment(&mut self, color: RagColor) {
        match color {
            RagColor::Red => self.red += 1,
            RagColor::Amber => self.amber += 1,
            RagColor::Gray => self.gray += 1,
            RagColor::Green => {}
        }
    }

    pub fn add(&mut self, other: &Flags) {
        self.red += other.red;
        self.amber += other.amber;
        self.gray += other.gray;
    }
}
