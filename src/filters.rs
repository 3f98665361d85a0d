//! Display helpers for numbers and memory sizes.

use std::fmt;
use std::str::FromStr;

/// Binary memory units, each 1024 times the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemoryUnit {
    B,
    KB,
    MB,
    GB,
    TB,
}

impl MemoryUnit {
    fn exponent(self) -> i32 {
        match self {
            Self::B => 0,
            Self::KB => 1,
            Self::MB => 2,
            Self::GB => 3,
            Self::TB => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B => "B",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
        }
    }
}

impl fmt::Display for MemoryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "B" => Ok(Self::B),
            "KB" => Ok(Self::KB),
            "MB" => Ok(Self::MB),
            "GB" => Ok(Self::GB),
            "TB" => Ok(Self::TB),
            _ => Err(format!(
                "Invalid memory unit '{}'. Valid values: B, KB, MB, GB, TB",
                s
            )),
        }
    }
}

/// Round to `precision` decimal places, halves away from zero.
pub fn number_round(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Convert `value` between memory units.
pub fn change_unit(value: f64, from: MemoryUnit, to: MemoryUnit) -> f64 {
    value * 1024f64.powi(from.exponent() - to.exponent())
}

/// Human readable size, e.g. `2 GB` for 2147483648 bytes.
pub fn format_memory(bytes: u64) -> String {
    let units = [MemoryUnit::TB, MemoryUnit::GB, MemoryUnit::MB, MemoryUnit::KB];
    let value = bytes as f64;
    for unit in units {
        let converted = change_unit(value, MemoryUnit::B, unit);
        if converted >= 1.0 {
            return format!("{} {}", number_round(converted, 1), unit);
        }
    }
    format!("{} {}", bytes, MemoryUnit::B)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_round() {
        assert_eq!(number_round(3.14159, 2), 3.14);
        assert_eq!(number_round(2.5, 0), 3.0);
        assert_eq!(number_round(-2.5, 0), -3.0);
        assert_eq!(number_round(1.005, 0), 1.0);
    }

    #[test]
    fn test_change_unit() {
        assert_eq!(change_unit(2_147_483_648.0, MemoryUnit::B, MemoryUnit::GB), 2.0);
        assert_eq!(change_unit(1.0, MemoryUnit::GB, MemoryUnit::MB), 1024.0);
        assert_eq!(change_unit(512.0, MemoryUnit::MB, MemoryUnit::GB), 0.5);
        assert_eq!(change_unit(7.0, MemoryUnit::KB, MemoryUnit::KB), 7.0);
    }

    #[test]
    fn test_memory_unit_parse() {
        assert_eq!("gb".parse::<MemoryUnit>().unwrap(), MemoryUnit::GB);
        assert!("PB".parse::<MemoryUnit>().is_err());
    }

    #[test]
    fn test_format_memory() {
        assert_eq!(format_memory(2_147_483_648), "2 GB");
        assert_eq!(format_memory(1536 * 1024 * 1024), "1.5 GB");
        assert_eq!(format_memory(512), "512 B");
    }
}
