//! Contract vocabulary: contract types, Tempo colors and price periods

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of electricity contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    /// Flat rate, one variable price
    Base,
    /// Peak / off-peak ("heures pleines / heures creuses")
    Hphc,
    /// Color-tiered: three day colors crossed with peak / off-peak
    Tempo,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Hphc => "hphc",
            Self::Tempo => "tempo",
        }
    }

    /// Whether the contract needs the daily Tempo color
    pub fn uses_colors(&self) -> bool {
        matches!(self, Self::Tempo)
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tempo day color as published by the color API (`codeJour`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempoColor {
    /// Not published yet (code 0) or an unknown code
    Undetermined,
    Blue,
    White,
    Red,
}

impl TempoColor {
    /// All colors in code order
    pub const ALL: [TempoColor; 4] = [
        TempoColor::Undetermined,
        TempoColor::Blue,
        TempoColor::White,
        TempoColor::Red,
    ];

    /// Map a `codeJour` value; anything outside 1..=3 is undetermined
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Blue,
            2 => Self::White,
            3 => Self::Red,
            _ => Self::Undetermined,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Undetermined => 0,
            Self::Blue => 1,
            Self::White => 2,
            Self::Red => 3,
        }
    }

    /// Name used in field values and keys
    pub fn label(&self) -> &'static str {
        match self {
            Self::Undetermined => "indéterminé",
            Self::Blue => "bleu",
            Self::White => "blanc",
            Self::Red => "rouge",
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Undetermined)
    }
}

impl fmt::Display for TempoColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TempoColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Time-of-day price period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PricePeriod {
    /// Heures pleines
    Peak,
    /// Heures creuses
    OffPeak,
}

impl PricePeriod {
    /// Short code used in field keys (`hp` / `hc`)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Peak => "hp",
            Self::OffPeak => "hc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_codes_map_both_ways() {
        for color in TempoColor::ALL {
            assert_eq!(TempoColor::from_code(color.code()), color);
        }
        assert_eq!(TempoColor::from_code(7), TempoColor::Undetermined);
        assert!(!TempoColor::from_code(0).is_defined());
        assert_eq!(TempoColor::Red.label(), "rouge");
    }

    #[test]
    fn contract_type_deserializes_lowercase() {
        let t: ContractType = serde_yaml::from_str("tempo").unwrap();
        assert_eq!(t, ContractType::Tempo);
        assert!(t.uses_colors());
        assert!(!ContractType::Hphc.uses_colors());
        assert_eq!(ContractType::Base.to_string(), "base");
    }
}
