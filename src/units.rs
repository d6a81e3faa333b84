//! Display unit systems.
//!
//! The engine always works in newtons and metres. A [`UnitSystem`] converts
//! values for presentation and converts user input back to base units.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a unit string cannot be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    /// Returned when the string does not contain a force and a length unit.
    #[error("expected \"force, length\" (received \"{0}\")")]
    Malformed(String),
    /// Returned for an unsupported force unit.
    #[error("unknown force unit \"{0}\"; use N, kN, kgf, Tonf or kip")]
    UnknownForce(String),
    /// Returned for an unsupported length unit.
    #[error("unknown length unit \"{0}\"; use m, cm, mm, ft or in")]
    UnknownLength(String),
}

/// Supported force units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ForceUnit {
    /// Newton.
    Newton,
    /// Kilonewton.
    #[default]
    Kilonewton,
    /// Kilogram-force.
    KilogramForce,
    /// Metric tonne-force.
    TonneForce,
    /// Kilopound.
    Kip,
}

impl ForceUnit {
    /// Newtons per unit.
    #[must_use]
    pub const fn newtons(self) -> f64 {
        match self {
            Self::Newton => 1.0,
            Self::Kilonewton => 1_000.0,
            Self::KilogramForce => 9.806_65,
            Self::TonneForce => 9_806.65,
            Self::Kip => 4_448.22,
        }
    }

    /// Unit symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Newton => "N",
            Self::Kilonewton => "kN",
            Self::KilogramForce => "kgf",
            Self::TonneForce => "Tonf",
            Self::Kip => "kip",
        }
    }
}

impl FromStr for ForceUnit {
    type Err = UnitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "N" => Ok(Self::Newton),
            "kN" => Ok(Self::Kilonewton),
            "kgf" => Ok(Self::KilogramForce),
            "Tonf" => Ok(Self::TonneForce),
            "kip" => Ok(Self::Kip),
            other => Err(UnitError::UnknownForce(other.to_owned())),
        }
    }
}

/// Supported length units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LengthUnit {
    /// Metre.
    #[default]
    Metre,
    /// Centimetre.
    Centimetre,
    /// Millimetre.
    Millimetre,
    /// International foot.
    Foot,
    /// International inch.
    Inch,
}

impl LengthUnit {
    /// Display units per metre.
    #[must_use]
    pub const fn per_metre(self) -> f64 {
        match self {
            Self::Metre => 1.0,
            Self::Centimetre => 100.0,
            Self::Millimetre => 1_000.0,
            Self::Foot => 3.280_84,
            Self::Inch => 39.370_1,
        }
    }

    /// Unit symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Metre => "m",
            Self::Centimetre => "cm",
            Self::Millimetre => "mm",
            Self::Foot => "ft",
            Self::Inch => "in",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = UnitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "m" => Ok(Self::Metre),
            "cm" => Ok(Self::Centimetre),
            "mm" => Ok(Self::Millimetre),
            "ft" => Ok(Self::Foot),
            "in" => Ok(Self::Inch),
            other => Err(UnitError::UnknownLength(other.to_owned())),
        }
    }
}

/// Pair of force and length units used for display.
///
/// # Examples
/// ```
/// use framex::units::UnitSystem;
///
/// let units: UnitSystem = "kN, mm".parse().expect("known units");
/// assert_eq!(units.to_display_force(2_500.0), 2.5);
/// assert_eq!(units.to_display_length(0.25), 250.0);
/// assert_eq!(units.distributed_load_label(), "kN/mm");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnitSystem {
    /// Force unit.
    pub force: ForceUnit,
    /// Length unit.
    pub length: LengthUnit,
}

impl UnitSystem {
    /// Convert a force in newtons to display units.
    #[must_use]
    pub fn to_display_force(self, newtons: f64) -> f64 {
        newtons / self.force.newtons()
    }

    /// Convert a displayed force to newtons.
    #[must_use]
    pub fn from_display_force(self, value: f64) -> f64 {
        value * self.force.newtons()
    }

    /// Convert a length in metres to display units.
    #[must_use]
    pub fn to_display_length(self, metres: f64) -> f64 {
        metres * self.length.per_metre()
    }

    /// Convert a displayed length to metres.
    #[must_use]
    pub fn from_display_length(self, value: f64) -> f64 {
        value / self.length.per_metre()
    }

    /// Convert a moment in newton-metres to display units.
    #[must_use]
    pub fn to_display_moment(self, newton_metres: f64) -> f64 {
        self.to_display_length(self.to_display_force(newton_metres))
    }

    /// Label for moments, such as `kN·m`.
    #[must_use]
    pub fn moment_label(self) -> String {
        format!("{}·{}", self.force.symbol(), self.length.symbol())
    }

    /// Label for distributed loads, such as `kN/m`.
    #[must_use]
    pub fn distributed_load_label(self) -> String {
        format!("{}/{}", self.force.symbol(), self.length.symbol())
    }
}

impl FromStr for UnitSystem {
    type Err = UnitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        let mut parts = compact.split(',');
        let (Some(force), Some(length)) = (parts.next(), parts.next()) else {
            return Err(UnitError::Malformed(value.to_owned()));
        };
        Ok(Self {
            force: force.parse()?,
            length: length.parse()?,
        })
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.force.symbol(), self.length.symbol())
    }
}
