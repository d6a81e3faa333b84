//! Element mass matrices and mass sources for modal analysis.
//!
//! Unit weights are stored in N/m³, so element masses are `A γ L / g`. Local
//! degrees of freedom follow the same order as [`crate::element`], and global
//! matrices are `Tᵀ m T` with the block rotation of the element.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::element::{block_rotation, Matrix12};

/// Standard gravity in m/s², used to turn weights into masses.
pub const GRAVITY: f64 = 9.80665;

/// Rotary inertia given to each lumped mass, as a fraction of the translational mass.
pub const ROTARY_MASS_RATIO: f64 = 1.0e-4;

/// How element self mass is distributed to the nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassDistribution {
    /// Half of the element mass at each end.
    #[default]
    Lumped,
    /// Cubic Hermite consistent mass.
    Consistent,
}

/// Where the masses of a modal analysis come from.
///
/// # Examples
/// ```
/// use framex::MassSource;
///
/// let source = MassSource::default().with_pattern("SDL", 1.0).with_pattern("LIVE", 0.3);
/// assert!(source.include_self_mass);
/// assert_eq!(source.scale_of("LIVE"), Some(0.3));
/// assert_eq!(source.scale_of("WIND"), None);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MassSource {
    /// Include the self mass of every element.
    pub include_self_mass: bool,
    /// Patterns whose vertical loads are converted to mass, with scale factors.
    pub load_patterns: Vec<(String, f64)>,
    /// Distribution of element self mass.
    pub distribution: MassDistribution,
}

impl Default for MassSource {
    fn default() -> Self {
        Self {
            include_self_mass: true,
            load_patterns: Vec::new(),
            distribution: MassDistribution::Lumped,
        }
    }
}

impl MassSource {
    /// Mass from load patterns only.
    #[must_use]
    pub fn loads_only() -> Self {
        Self {
            include_self_mass: false,
            ..Self::default()
        }
    }

    /// Convert the vertical loads of `pattern` to mass, scaled by `scale`.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>, scale: f64) -> Self {
        self.load_patterns.push((pattern.into(), scale));
        self
    }

    /// Use `distribution` for element self mass.
    #[must_use]
    pub fn with_distribution(mut self, distribution: MassDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    /// Combined scale factor of `pattern`, if it contributes mass.
    #[must_use]
    pub fn scale_of(&self, pattern: &str) -> Option<f64> {
        self.load_patterns
            .iter()
            .filter(|(name, _)| name == pattern)
            .map(|(_, scale)| *scale)
            .reduce(|a, b| a + b)
    }
}

/// Diagonal of a lumped point mass: three translations and three small rotary inertias.
#[must_use]
pub fn point_mass(mass: f64) -> [f64; 6] {
    let rotary = mass * ROTARY_MASS_RATIO;
    [mass, mass, mass, rotary, rotary, rotary]
}

/// Lumped element mass matrix with half of `total_mass` at each end.
#[must_use]
pub fn lumped_mass(total_mass: f64) -> Matrix12 {
    let half = point_mass(total_mass / 2.0);
    let mut m = Matrix12::zeros();
    for dof in 0..12 {
        m[(dof, dof)] = half[dof % 6];
    }
    m
}

/// Consistent element mass matrix in local coordinates.
///
/// `polar_radius_squared` is `(I22 + I33) / A`, used for the torsional inertia.
///
/// # Examples
/// ```
/// use framex::mass::consistent_mass;
///
/// let m = consistent_mass(420.0, 2.0, 0.01);
/// assert_eq!(m[(2, 2)], 156.0);
/// assert_eq!(m[(0, 6)], 70.0);
/// assert_eq!(m, m.transpose());
/// ```
#[must_use]
pub fn consistent_mass(total_mass: f64, length: f64, polar_radius_squared: f64) -> Matrix12 {
    let mut m = Matrix12::zeros();
    let l = length;

    let axial = total_mass / 6.0;
    let torsion = total_mass * polar_radius_squared / 6.0;
    for (dof, value) in [(0, axial), (3, torsion)] {
        m[(dof, dof)] = 2.0 * value;
        m[(dof, dof + 6)] = value;
        m[(dof + 6, dof)] = value;
        m[(dof + 6, dof + 6)] = 2.0 * value;
    }

    let c = total_mass / 420.0;
    // u2 with r3, then u3 with r2 where the coupling terms change sign.
    for (v1, r1, v2, r2, sign) in [(1, 5, 7, 11, 1.0), (2, 4, 8, 10, -1.0)] {
        let entries = [
            (v1, v1, 156.0),
            (v1, r1, sign * 22.0 * l),
            (v1, v2, 54.0),
            (v1, r2, -sign * 13.0 * l),
            (r1, r1, 4.0 * l * l),
            (r1, v2, sign * 13.0 * l),
            (r1, r2, -3.0 * l * l),
            (v2, v2, 156.0),
            (v2, r2, -sign * 22.0 * l),
            (r2, r2, 4.0 * l * l),
        ];
        for (row, col, value) in entries {
            m[(row, col)] = c * value;
            m[(col, row)] = c * value;
        }
    }
    m
}

/// Element mass matrix in global coordinates.
#[must_use]
pub fn global_element_mass(
    distribution: MassDistribution,
    total_mass: f64,
    length: f64,
    polar_radius_squared: f64,
    rotation: &Matrix3<f64>,
) -> Matrix12 {
    let local = match distribution {
        MassDistribution::Lumped => lumped_mass(total_mass),
        MassDistribution::Consistent => consistent_mass(total_mass, length, polar_radius_squared),
    };
    let t = block_rotation(rotation);
    t.transpose() * local * t
}
