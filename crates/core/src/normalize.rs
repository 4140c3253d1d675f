use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TsodError;

/// Value transform applied to every point of a series before training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    None,
    /// Natural logarithm.
    Log,
    Log10,
    Log1p,
    Sqrt,
}

impl NormalizationMode {
    /// Apply the transform to a single value.
    ///
    /// The logarithmic modes map anything below the smallest positive
    /// representable magnitude (`1 / f64::MAX`) to `0.0` instead of
    /// producing `-inf`/`NaN`.
    pub fn apply(self, value: f64) -> f64 {
        let tiny = 1.0 / f64::MAX;
        match self {
            NormalizationMode::None => value,
            NormalizationMode::Log => {
                if value < tiny {
                    0.0
                } else {
                    value.ln()
                }
            }
            NormalizationMode::Log10 => {
                if value < tiny {
                    0.0
                } else {
                    value.log10()
                }
            }
            NormalizationMode::Log1p => {
                if value < tiny {
                    0.0
                } else {
                    value.ln_1p()
                }
            }
            NormalizationMode::Sqrt => value.sqrt(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NormalizationMode::None => "none",
            NormalizationMode::Log => "log",
            NormalizationMode::Log10 => "log10",
            NormalizationMode::Log1p => "log1p",
            NormalizationMode::Sqrt => "sqrt",
        }
    }
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationMode {
    type Err = TsodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(NormalizationMode::None),
            "log" | "ln" => Ok(NormalizationMode::Log),
            "log10" => Ok(NormalizationMode::Log10),
            "log1p" => Ok(NormalizationMode::Log1p),
            "sqrt" => Ok(NormalizationMode::Sqrt),
            other => Err(TsodError::Config(format!(
                "unknown normalization mode '{}'",
                other
            ))),
        }
    }
}
