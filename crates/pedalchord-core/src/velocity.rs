//! Velocity and transpose values and their pedal → bank → global inheritance.

use crate::error::{Error, Result};
use std::ops::RangeInclusive;
use tracing::info;

/// Dynamic markings accepted in place of a numeric velocity.
pub const DYNAMICS: [(&str, u8); 11] = [
    ("s", 0),
    ("pppp", 10),
    ("ppp", 23),
    ("pp", 36),
    ("p", 49),
    ("mp", 62),
    ("mf", 75),
    ("f", 88),
    ("ff", 101),
    ("fff", 114),
    ("ffff", 127),
];

// Lower edge of each dynamic's bucket for the reverse lookup.
const DYNAMIC_BUCKETS: [u8; 11] = [0, 1, 23, 36, 49, 62, 75, 88, 101, 114, 127];

pub const VELOCITY_RANGE: RangeInclusive<i32> = 0..=127;
pub const TRANSPOSE_RANGE: RangeInclusive<i32> = -127..=127;

/// One configured velocity or transpose value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Absolute(i32),
    /// Offset applied to whatever an ancestor (or the strike) provides.
    Relative(i32),
}

impl Level {
    /// Parses `mf`, `100`, `+10` or `-5`.
    pub fn parse_velocity(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Some((_, value)) = DYNAMICS.iter().find(|(symbol, _)| *symbol == text) {
            return Ok(Level::Absolute(*value as i32));
        }
        Self::parse_numeric(text, "velocity", &VELOCITY_RANGE)
    }

    /// Parses `12` or `+12`/`-12` semitones.
    pub fn parse_transpose(text: &str) -> Result<Self> {
        Self::parse_numeric(text.trim(), "transpose", &TRANSPOSE_RANGE)
    }

    fn parse_numeric(text: &str, what: &str, range: &RangeInclusive<i32>) -> Result<Self> {
        let invalid = || Error::Config(format!("invalid {} '{}'", what, text));

        let (sign, digits) = match text.as_bytes().first() {
            Some(b'+') => (Some(1), &text[1..]),
            Some(b'-') => (Some(-1), &text[1..]),
            _ => (None, text),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let magnitude: i32 = digits.parse().map_err(|_| invalid())?;
        if magnitude > *range.end() {
            return Err(Error::Config(format!(
                "{} '{}' is out of range {}..={}",
                what,
                text,
                range.start(),
                range.end()
            )));
        }

        Ok(match sign {
            Some(sign) => Level::Relative(sign * magnitude),
            None => Level::Absolute(magnitude),
        })
    }

    /// Combines a value defined on a child with what its ancestors resolved to.
    pub fn inherit(self, parent: Option<Level>, range: &RangeInclusive<i32>) -> Level {
        match (self, parent) {
            (Level::Absolute(value), _) => Level::Absolute(value),
            (Level::Relative(offset), Some(Level::Absolute(base))) => {
                Level::Absolute((base + offset).clamp(*range.start(), *range.end()))
            }
            (Level::Relative(offset), Some(Level::Relative(base))) => Level::Relative(base + offset),
            (Level::Relative(offset), None) => Level::Relative(offset),
        }
    }

    pub fn value(self) -> i32 {
        match self {
            Level::Absolute(value) | Level::Relative(value) => value,
        }
    }
}

/// Folds global → bank → pedal into a single level.
pub fn resolve_level(
    global: Option<Level>,
    bank: Option<Level>,
    pedal: Option<Level>,
    range: &RangeInclusive<i32>,
) -> Option<Level> {
    [bank, pedal]
        .into_iter()
        .fold(global, |resolved, level| match level {
            Some(level) => Some(level.inherit(resolved, range)),
            None => resolved,
        })
}

/// Dynamic marking closest to `velocity`, for diagnostics.
pub fn velocity_symbol_for(velocity: u8) -> &'static str {
    let bucket = DYNAMIC_BUCKETS
        .partition_point(|edge| *edge <= velocity)
        .saturating_sub(1);
    DYNAMICS[bucket].0
}

/// Velocity of a compiled note message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Velocity {
    Absolute(u8),
    Relative(i16),
}

impl Velocity {
    /// An unconfigured velocity follows the strike.
    pub fn from_level(level: Option<Level>) -> Self {
        match level {
            Some(Level::Absolute(value)) => {
                Velocity::Absolute(value.clamp(*VELOCITY_RANGE.start(), *VELOCITY_RANGE.end()) as u8)
            }
            Some(Level::Relative(offset)) => {
                Velocity::Relative(offset.clamp(i16::MIN as i32, i16::MAX as i32) as i16)
            }
            None => Velocity::Relative(0),
        }
    }

    /// Applies the velocity to an incoming strike. Relative results are kept
    /// audible: they clamp to 1..=127.
    pub fn resolve(self, strike: u8) -> u8 {
        match self {
            Velocity::Absolute(value) => value,
            Velocity::Relative(offset) => {
                let wanted = strike as i32 + offset as i32;
                let clamped = wanted.clamp(1, 127);
                if clamped != wanted {
                    info!("Velocity {} clamped to {}", wanted, clamped);
                }
                clamped as u8
            }
        }
    }
}
