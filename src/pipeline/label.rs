//! Score thresholds and the worst-case aggregate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scores at or above this are halal.
pub const HALAL_THRESHOLD: f64 = 0.7;

/// Scores at or below this are haram.
pub const HARAM_THRESHOLD: f64 = 0.3;

/// Classification of a single ingredient or of a whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Halal,
    Haram,
    Doubtful,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Halal => "halal",
            Label::Haram => "haram",
            Label::Doubtful => "doubtful",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a model score to a label. Both thresholds are inclusive; NaN is doubtful.
pub fn classify(score: f64) -> Label {
    if score >= HALAL_THRESHOLD {
        Label::Halal
    } else if score <= HARAM_THRESHOLD {
        Label::Haram
    } else {
        Label::Doubtful
    }
}

/// Reduce labels to one: any haram wins, then any doubtful, else halal.
pub fn aggregate<I>(labels: I) -> Label
where
    I: IntoIterator<Item = Label>,
{
    let mut overall = Label::Halal;
    for label in labels {
        match label {
            Label::Haram => return Label::Haram,
            Label::Doubtful => overall = Label::Doubtful,
            Label::Halal => {}
        }
    }
    overall
}
