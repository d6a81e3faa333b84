//! Load patterns, load cases and member loads.
//!
//! Member loads are turned into fixed-end forces (FEF) in local element
//! coordinates. Sign convention: FEF are the forces the fixed supports exert
//! on the element, so a downward load produces positive end shears.

use nalgebra::{Matrix4, RowVector4, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::element::{shear_deformation_factor, PreparedElement, Vector12};

/// Named group of loads, optionally generating the structure's self weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadPattern {
    /// Multiplier applied to the self weight of every element; zero disables it.
    #[serde(default)]
    pub self_weight_multiplier: f64,
}

/// Linear combination of load patterns analysed together.
///
/// # Examples
/// ```
/// use framex::LoadCase;
///
/// let ultimate = LoadCase::new().with_pattern("DEAD", 1.2).with_pattern("LIVE", 1.6);
/// assert_eq!(ultimate.patterns().len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadCase {
    patterns: Vec<(String, f64)>,
}

impl LoadCase {
    /// Empty load case.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern with a scale factor.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>, scale: f64) -> Self {
        self.patterns.push((pattern.into(), scale));
        self
    }

    /// Patterns and their scale factors in insertion order.
    #[must_use]
    pub fn patterns(&self) -> &[(String, f64)] {
        &self.patterns
    }

    /// Combined scale factor of `pattern` in this case, if it participates.
    #[must_use]
    pub fn scale_of(&self, pattern: &str) -> Option<f64> {
        self.patterns
            .iter()
            .filter(|(name, _)| name == pattern)
            .map(|(_, scale)| *scale)
            .reduce(|a, b| a + b)
    }
}

/// Axes in which a member load is expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Global X, Y and Z.
    #[default]
    #[serde(alias = "Global")]
    Global,
    /// Element local 1, 2 and 3.
    #[serde(alias = "Local")]
    Local,
}

/// Direction of a concentrated member load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadDirection {
    /// Global X or local 1.
    X,
    /// Global Y or local 2.
    Y,
    /// Global Z or local 3.
    Z,
    /// Global -Z regardless of the coordinate system.
    Gravity,
}

/// Location of a concentrated load along the member, measured from the start node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LoadPosition {
    /// Distance in metres along the centre-to-centre length.
    Absolute(f64),
    /// Fraction of the centre-to-centre length in `[0, 1]`.
    Relative(f64),
}

impl LoadPosition {
    /// Distance from the start node for a member of `total_length`.
    #[must_use]
    pub fn distance(self, total_length: f64) -> f64 {
        match self {
            Self::Absolute(distance) => distance,
            Self::Relative(ratio) => ratio * total_length,
        }
    }
}

/// Load applied along a frame element.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemberLoad {
    /// Uniform load over the full length, in newtons per metre.
    Distributed {
        /// Intensity along X (or local 1).
        #[serde(default)]
        wx: f64,
        /// Intensity along Y (or local 2).
        #[serde(default)]
        wy: f64,
        /// Intensity along Z (or local 3).
        #[serde(default)]
        wz: f64,
        /// Axes of the intensities.
        #[serde(default)]
        coordinates: CoordinateSystem,
    },
    /// Concentrated force in newtons.
    Point {
        /// Signed magnitude.
        force: f64,
        /// Where the force acts.
        position: LoadPosition,
        /// Direction of a positive force.
        direction: LoadDirection,
        /// Axes of the direction.
        #[serde(default)]
        coordinates: CoordinateSystem,
    },
}

impl MemberLoad {
    /// Uniform load in global axes.
    #[must_use]
    pub const fn uniform(wx: f64, wy: f64, wz: f64) -> Self {
        Self::Distributed {
            wx,
            wy,
            wz,
            coordinates: CoordinateSystem::Global,
        }
    }

    /// Uniform load in local axes.
    #[must_use]
    pub const fn uniform_local(w1: f64, w2: f64, w3: f64) -> Self {
        Self::Distributed {
            wx: w1,
            wy: w2,
            wz: w3,
            coordinates: CoordinateSystem::Local,
        }
    }

    /// Concentrated force in global axes.
    #[must_use]
    pub const fn point(force: f64, position: LoadPosition, direction: LoadDirection) -> Self {
        Self::Point {
            force,
            position,
            direction,
            coordinates: CoordinateSystem::Global,
        }
    }
}

/// Fixed-end forces of a uniform load `w` (local intensities) over `length`.
#[must_use]
pub fn uniform_fixed_end_forces(w: &Vector3<f64>, length: f64) -> Vector12 {
    let (wx, wy, wz) = (w.x, w.y, w.z);
    let half = length / 2.0;
    let moment = length * length / 12.0;
    let mut fef = Vector12::zeros();
    fef[0] = -wx * half;
    fef[6] = -wx * half;
    fef[1] = -wy * half;
    fef[7] = -wy * half;
    fef[5] = -wy * moment;
    fef[11] = wy * moment;
    fef[2] = -wz * half;
    fef[8] = -wz * half;
    fef[4] = wz * moment;
    fef[10] = -wz * moment;
    fef
}

/// Transverse shape function values `[N1, N2, N3, N4]` at distance `a` on a
/// Timoshenko beam with shear parameter `phi`.
///
/// `N1`, `N3` weight the end displacements and `N2`, `N4` the end rotations.
/// Returns `None` for degenerate spans.
#[must_use]
pub fn timoshenko_shape_values(length: f64, a: f64, phi: f64) -> Option<[f64; 4]> {
    if length <= 0.0 {
        return None;
    }
    let omega = phi * length * length / 12.0;
    let l = length;
    #[rustfmt::skip]
    let boundary = Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 6.0 * omega,
        1.0, l, l * l, l * l * l,
        0.0, 1.0, 2.0 * l, 3.0 * l * l + 6.0 * omega,
    );
    let inverse = boundary.try_inverse()?;
    let n = RowVector4::new(1.0, a, a * a, a * a * a) * inverse;
    Some([n[0], n[1], n[2], n[3]])
}

/// Fixed-end forces of a concentrated local force `p` at clear-span distance `a`.
#[must_use]
pub fn point_fixed_end_forces(
    p: &Vector3<f64>,
    a: f64,
    length: f64,
    phi_2: f64,
    phi_3: f64,
) -> Vector12 {
    let mut fef = Vector12::zeros();
    let ratio = a / length;
    fef[0] = -p.x * (1.0 - ratio);
    fef[6] = -p.x * ratio;

    if let Some([n1, n2, n3, n4]) = timoshenko_shape_values(length, a, phi_2) {
        fef[1] = -p.y * n1;
        fef[5] = -p.y * n2;
        fef[7] = -p.y * n3;
        fef[11] = -p.y * n4;
    }
    if let Some([n1, n2, n3, n4]) = timoshenko_shape_values(length, a, phi_3) {
        fef[2] = -p.z * n1;
        fef[4] = p.z * n2;
        fef[8] = -p.z * n3;
        fef[10] = p.z * n4;
    }
    fef
}

/// Local effect of one member load on a prepared element.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MemberLoadEffect {
    /// Fixed-end forces before release condensation.
    pub(crate) fixed_end_forces: Vector12,
    /// Local uniform intensity acting over the rigid end zones.
    pub(crate) rigid_zone_intensity: Vector3<f64>,
}

/// Convert a member load scaled by `scale` into local fixed-end forces.
pub(crate) fn member_load_effect(
    element: &PreparedElement,
    load: &MemberLoad,
    scale: f64,
) -> MemberLoadEffect {
    let rotation = &element.rotation;
    match *load {
        MemberLoad::Distributed {
            wx,
            wy,
            wz,
            coordinates,
        } => {
            let defined = Vector3::new(wx, wy, wz) * scale;
            let local = match coordinates {
                CoordinateSystem::Global => rotation * defined,
                CoordinateSystem::Local => defined,
            };
            MemberLoadEffect {
                fixed_end_forces: uniform_fixed_end_forces(&local, element.clear_length),
                rigid_zone_intensity: local,
            }
        }
        MemberLoad::Point {
            force,
            position,
            direction,
            coordinates,
        } => {
            let magnitude = force * scale;
            let (defined, coordinates) = match direction {
                LoadDirection::X => (Vector3::new(magnitude, 0.0, 0.0), coordinates),
                LoadDirection::Y => (Vector3::new(0.0, magnitude, 0.0), coordinates),
                LoadDirection::Z => (Vector3::new(0.0, 0.0, magnitude), coordinates),
                LoadDirection::Gravity => {
                    (Vector3::new(0.0, 0.0, -magnitude), CoordinateSystem::Global)
                }
            };
            let local = match coordinates {
                CoordinateSystem::Global => rotation * defined,
                CoordinateSystem::Local => defined,
            };

            let distance = position.distance(element.total_length);
            let [start_rigid, end_rigid] = element.end_offsets;
            if distance < start_rigid || distance > element.total_length - end_rigid {
                warn!(
                    element = element.id.index(),
                    distance,
                    "point load lies outside the clear span and is ignored"
                );
                return MemberLoadEffect::default();
            }
            let a = distance - start_rigid;
            let props = &element.properties;
            let e = element.material.elastic_modulus;
            let g = element.material.shear_modulus();
            let l = element.clear_length;
            let phi_2 = shear_deformation_factor(e * props.i33, g, props.shear_area_2, l);
            let phi_3 = shear_deformation_factor(e * props.i22, g, props.shear_area_3, l);
            MemberLoadEffect {
                fixed_end_forces: point_fixed_end_forces(&local, a, l, phi_2, phi_3),
                rigid_zone_intensity: Vector3::zeros(),
            }
        }
    }
}

/// Global nodal loads produced by a uniform intensity acting on the rigid end zones.
///
/// The zone load `w·r` is applied at the node together with its moment about
/// the node through the zone centroid.
pub(crate) fn rigid_zone_loads(element: &PreparedElement, intensity: &Vector3<f64>) -> Vector12 {
    let mut loads = Vector12::zeros();
    let [start_rigid, end_rigid] = element.end_offsets;
    let to_global = element.rotation.transpose();
    let zones = [
        (0, start_rigid, start_rigid / 2.0),
        (6, end_rigid, -end_rigid / 2.0),
    ];
    for (slot, (base, zone, centroid_x)) in zones.into_iter().enumerate() {
        if zone <= 0.0 {
            continue;
        }
        let zone_force = intensity * zone;
        let centroid = Vector3::new(centroid_x, 0.0, 0.0) + element.insertion_offsets[slot];
        let zone_moment = centroid.cross(&zone_force);
        loads
            .fixed_rows_mut::<3>(base)
            .copy_from(&(to_global * zone_force));
        loads
            .fixed_rows_mut::<3>(base + 3)
            .copy_from(&(to_global * zone_moment));
    }
    loads
}
