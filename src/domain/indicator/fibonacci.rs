//! Fibonacci retracement levels.
//!
//! level(r) = swing_high - r * (swing_high - swing_low)
//! When swing_high == swing_low every level collapses to that price.

use std::fmt;

/// The five retracement ratios the strategy trades around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FibLevel {
    L23_6,
    L38_2,
    L50,
    L61_8,
    L78_6,
}

impl FibLevel {
    pub const ALL: [FibLevel; 5] = [
        FibLevel::L23_6,
        FibLevel::L38_2,
        FibLevel::L50,
        FibLevel::L61_8,
        FibLevel::L78_6,
    ];

    pub fn ratio(self) -> f64 {
        match self {
            FibLevel::L23_6 => 0.236,
            FibLevel::L38_2 => 0.382,
            FibLevel::L50 => 0.5,
            FibLevel::L61_8 => 0.618,
            FibLevel::L78_6 => 0.786,
        }
    }
}

impl fmt::Display for FibLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FibLevel::L23_6 => "23.6",
            FibLevel::L38_2 => "38.2",
            FibLevel::L50 => "50",
            FibLevel::L61_8 => "61.8",
            FibLevel::L78_6 => "78.6",
        };
        write!(f, "Fib {}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevels {
    pub fib23_6: f64,
    pub fib38_2: f64,
    pub fib50: f64,
    pub fib61_8: f64,
    pub fib78_6: f64,
}

impl FibLevels {
    pub fn from_swing(swing_high: f64, swing_low: f64) -> Self {
        let diff = swing_high - swing_low;
        let at = |level: FibLevel| swing_high - level.ratio() * diff;
        FibLevels {
            fib23_6: at(FibLevel::L23_6),
            fib38_2: at(FibLevel::L38_2),
            fib50: at(FibLevel::L50),
            fib61_8: at(FibLevel::L61_8),
            fib78_6: at(FibLevel::L78_6),
        }
    }

    pub fn get(&self, level: FibLevel) -> f64 {
        match level {
            FibLevel::L23_6 => self.fib23_6,
            FibLevel::L38_2 => self.fib38_2,
            FibLevel::L50 => self.fib50,
            FibLevel::L61_8 => self.fib61_8,
            FibLevel::L78_6 => self.fib78_6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_between_swing_points() {
        let levels = FibLevels::from_swing(110.0, 100.0);
        assert!((levels.fib23_6 - 107.64).abs() < 1e-9);
        assert!((levels.fib38_2 - 106.18).abs() < 1e-9);
        assert!((levels.fib50 - 105.0).abs() < 1e-9);
        assert!((levels.fib61_8 - 103.82).abs() < 1e-9);
        assert!((levels.fib78_6 - 102.14).abs() < 1e-9);
    }

    #[test]
    fn levels_descend_from_high_to_low() {
        let levels = FibLevels::from_swing(250.0, 180.0);
        let values: Vec<f64> = FibLevel::ALL.iter().map(|&l| levels.get(l)).collect();
        assert!(values.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn flat_swing_collapses_levels() {
        let levels = FibLevels::from_swing(50.0, 50.0);
        for level in FibLevel::ALL {
            assert_eq!(levels.get(level), 50.0);
        }
    }

    #[test]
    fn level_display() {
        assert_eq!(FibLevel::L61_8.to_string(), "Fib 61.8");
        assert_eq!(FibLevel::L50.to_string(), "Fib 50");
    }
}
