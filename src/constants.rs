//! The table of governing mathematical constants.
//!
//! Every vortex is shaped by a single constant. The golden ratio gives the
//! classic low-discrepancy spiral; the others stretch or compress the same
//! construction into different silhouettes.
//!
//! The table is closed: only the variants of [`MathConstant`] exist, and none
//! of them is zero, so the field generator and the transform can divide by
//! the selected value without checking.
//!
//! ```ignore
//! use chromatic_vortex::MathConstant;
//!
//! let c: MathConstant = "pi".parse()?;
//! assert_eq!(c.label(), "Pi π");
//! let next = c.next(); // Euler e
//! ```

use std::fmt;
use std::str::FromStr;

/// Golden ratio, (1 + √5) / 2.
pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// A named mathematical constant that drives field layout and animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MathConstant {
    /// φ = (1 + √5) / 2
    #[default]
    GoldenRatio,
    /// π
    Pi,
    /// Euler's number e
    Euler,
    /// τ = 2π
    Tau,
    /// √2
    SilverRatio,
    /// √3
    Root3,
    /// √5
    Root5,
    /// Feigenbaum δ
    Feigenbaum,
    /// Plastic number ρ
    Plastic,
    /// Catalan's constant G
    Catalan,
    /// π / φ
    PiOverPhi,
    /// e^(π/4)
    EPiQuarter,
}

impl MathConstant {
    /// All constants, in display order.
    pub const ALL: [MathConstant; 12] = [
        MathConstant::GoldenRatio,
        MathConstant::Pi,
        MathConstant::Euler,
        MathConstant::Tau,
        MathConstant::SilverRatio,
        MathConstant::Root3,
        MathConstant::Root5,
        MathConstant::Feigenbaum,
        MathConstant::Plastic,
        MathConstant::Catalan,
        MathConstant::PiOverPhi,
        MathConstant::EPiQuarter,
    ];

    /// Numeric value in double precision.
    pub fn value(self) -> f64 {
        match self {
            MathConstant::GoldenRatio => GOLDEN_RATIO,
            MathConstant::Pi => std::f64::consts::PI,
            MathConstant::Euler => std::f64::consts::E,
            MathConstant::Tau => std::f64::consts::TAU,
            MathConstant::SilverRatio => std::f64::consts::SQRT_2,
            MathConstant::Root3 => 1.732_050_807_568_877_2,
            MathConstant::Root5 => 2.236_067_977_499_79,
            MathConstant::Feigenbaum => 4.669_201_609,
            MathConstant::Plastic => 1.324_717_957_24,
            MathConstant::Catalan => 0.915_965_594,
            MathConstant::PiOverPhi => std::f64::consts::PI / GOLDEN_RATIO,
            MathConstant::EPiQuarter => 2.193_280_050_738_015,
        }
    }

    /// Value as uploaded to the GPU.
    #[inline]
    pub fn value_f32(self) -> f32 {
        self.value() as f32
    }

    /// Human readable label, as shown in the control panel.
    pub fn label(self) -> &'static str {
        match self {
            MathConstant::GoldenRatio => "Golden Ratio φ",
            MathConstant::Pi => "Pi π",
            MathConstant::Euler => "Euler e",
            MathConstant::Tau => "Tau τ",
            MathConstant::SilverRatio => "Silver Ratio √2",
            MathConstant::Root3 => "Root 3 √3",
            MathConstant::Root5 => "Root 5 √5",
            MathConstant::Feigenbaum => "Feigenbaum δ",
            MathConstant::Plastic => "Plastic ρ",
            MathConstant::Catalan => "Catalan G",
            MathConstant::PiOverPhi => "π/φ",
            MathConstant::EPiQuarter => "e^(π/4)",
        }
    }

    /// Short ASCII identifier, used on the command line.
    pub fn id(self) -> &'static str {
        match self {
            MathConstant::GoldenRatio => "phi",
            MathConstant::Pi => "pi",
            MathConstant::Euler => "e",
            MathConstant::Tau => "tau",
            MathConstant::SilverRatio => "sqrt2",
            MathConstant::Root3 => "sqrt3",
            MathConstant::Root5 => "sqrt5",
            MathConstant::Feigenbaum => "feigenbaum",
            MathConstant::Plastic => "plastic",
            MathConstant::Catalan => "catalan",
            MathConstant::PiOverPhi => "pi-over-phi",
            MathConstant::EPiQuarter => "e-pi-4",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|&c| c == self).unwrap_or(0)
    }

    /// The following constant in display order, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    /// The preceding constant in display order, wrapping around.
    pub fn previous(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }

    /// Look up a constant by label or id (ids are case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label() == trimmed || c.id().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for MathConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a name matches no entry of the constant table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConstantError {
    name: String,
}

impl fmt::Display for ParseConstantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = MathConstant::ALL.iter().map(|c| c.id()).collect();
        write!(
            f,
            "Unknown constant '{}'. Expected one of: {}",
            self.name,
            ids.join(", ")
        )
    }
}

impl std::error::Error for ParseConstantError {}

impl FromStr for MathConstant {
    type Err = ParseConstantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseConstantError {
            name: s.to_string(),
        })
    }
}
