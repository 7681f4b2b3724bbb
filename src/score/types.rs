use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Match strength for one candidate.
///
/// [`Score::Null`] means "no information". It orders below every real value and never
/// satisfies a numeric comparison, so decision code must check [`Score::is_real`] (or use
/// the `Option`-returning helpers) before doing arithmetic.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Score {
    Value(f64),
    #[default]
    Null,
}

impl Score {
    pub const ZERO: Score = Score::Value(0.0);
    pub const ONE: Score = Score::Value(1.0);
    pub const NULL: Score = Score::Null;

    pub fn value(value: f64) -> Self {
        Score::Value(value)
    }

    /// Returns `true` for a real (non-sentinel) score.
    pub fn is_real(&self) -> bool {
        matches!(self, Score::Value(_))
    }

    /// The numeric value, if real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Score::Value(v) => Some(*v),
            Score::Null => None,
        }
    }

    /// `self / other` when both are real and `other` is non-zero.
    pub fn ratio(&self, other: &Score) -> Option<f64> {
        match (self, other) {
            (Score::Value(a), Score::Value(b)) if *b != 0.0 => Some(a / b),
            _ => None,
        }
    }

    /// `self - other` when both are real.
    pub fn difference(&self, other: &Score) -> Option<f64> {
        match (self, other) {
            (Score::Value(a), Score::Value(b)) => Some(a - b),
            _ => None,
        }
    }

    pub fn scale(self, factor: f64) -> Score {
        match self {
            Score::Value(v) => Score::Value(v * factor),
            Score::Null => Score::Null,
        }
    }

    /// `true` when real and `>= threshold`.
    pub fn at_least(&self, threshold: f64) -> bool {
        matches!(self, Score::Value(v) if *v >= threshold)
    }

    /// `true` when real and strictly `> threshold`.
    pub fn above(&self, threshold: f64) -> bool {
        matches!(self, Score::Value(v) if *v > threshold)
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Score::Value(a), Score::Value(b)) => a.total_cmp(b),
            (Score::Value(_), Score::Null) => Ordering::Greater,
            (Score::Null, Score::Value(_)) => Ordering::Less,
            (Score::Null, Score::Null) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

/// `Null` is the identity on either side.
impl Add for Score {
    type Output = Score;

    fn add(self, other: Score) -> Score {
        match (self, other) {
            (Score::Value(a), Score::Value(b)) => Score::Value(a + b),
            (Score::Value(a), Score::Null) | (Score::Null, Score::Value(a)) => Score::Value(a),
            (Score::Null, Score::Null) => Score::Null,
        }
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Score::Value(value)
    }
}

impl From<Option<f64>> for Score {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Score::Null, Score::Value)
    }
}

impl From<Score> for Option<f64> {
    fn from(score: Score) -> Self {
        score.as_f64()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Value(v) => write!(f, "{}", v),
            Score::Null => write!(f, "NullScore"),
        }
    }
}
