use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Electrochemical technique a series was measured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Cyclic voltammetry: potential vs. current.
    #[serde(rename = "CV")]
    Cv,
    /// Electrochemical impedance spectroscopy: frequency vs. impedance.
    #[serde(rename = "EIS")]
    Eis,
    /// Chronoamperometry: time vs. current.
    #[serde(rename = "CA")]
    Ca,
    /// Chronopotentiometry: time vs. potential.
    #[serde(rename = "CP")]
    Cp,
    /// Linear sweep voltammetry.
    #[serde(rename = "LSV")]
    Lsv,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Cv => write!(f, "CV"),
            Domain::Eis => write!(f, "EIS"),
            Domain::Ca => write!(f, "CA"),
            Domain::Cp => write!(f, "CP"),
            Domain::Lsv => write!(f, "LSV"),
        }
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CV" => Ok(Domain::Cv),
            "EIS" => Ok(Domain::Eis),
            "CA" => Ok(Domain::Ca),
            "CP" => Ok(Domain::Cp),
            "LSV" => Ok(Domain::Lsv),
            other => Err(format!("unknown domain: '{}'", other)),
        }
    }
}
