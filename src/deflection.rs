//! Deflected shape of a frame element from its end displacements.
//!
//! Transverse displacements use cubic Hermite interpolation so the curve
//! matches both the end translations and the end slopes. Axial stretch and
//! twist vary linearly.

use nalgebra::{Matrix3, Vector3};

use crate::geometry::{Displacement, Point};

/// Number of stations used when none is requested.
pub const DEFAULT_STATIONS: usize = 11;

/// Elements shorter than this are drawn as two points.
const DEGENERATE_LENGTH: f64 = 1.0e-6;

/// Sample of a deflected element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Station {
    /// Displaced position in global coordinates.
    pub position: Point,
    /// Unit tangent of the deflected axis in global coordinates.
    pub tangent: Vector3<f64>,
    /// Rotation about the member axis in radians.
    pub twist: f64,
}

/// Compute the deflected shape of an element.
///
/// `rotation` holds the local axes as rows. Displacements are global and are
/// multiplied by `scale` before interpolation. At least two stations are
/// returned; `stations` below two is raised to two.
///
/// # Examples
/// ```
/// use nalgebra::Matrix3;
/// use framex::deflection::deflected_shape;
/// use framex::{point, Displacement};
///
/// let fixed = Displacement::default();
/// let tip = Displacement::new(0.0, 0.0, -0.01, 0.0, 0.015, 0.0);
/// let shape = deflected_shape(
///     point(0.0, 0.0, 0.0),
///     point(2.0, 0.0, 0.0),
///     &Matrix3::identity(),
///     fixed,
///     tip,
///     1.0,
///     5,
/// );
/// assert_eq!(shape.len(), 5);
/// assert!((shape[4].position.z + 0.01).abs() < 1.0e-12);
/// ```
#[must_use]
pub fn deflected_shape(
    start: Point,
    end: Point,
    rotation: &Matrix3<f64>,
    start_displacement: Displacement,
    end_displacement: Displacement,
    scale: f64,
    stations: usize,
) -> Vec<Station> {
    let origin = start.to_vector();
    let length = (end.to_vector() - origin).norm();
    let axis = rotation.row(0).transpose();
    if length < DEGENERATE_LENGTH {
        return vec![
            Station {
                position: start,
                tangent: axis,
                twist: 0.0,
            },
            Station {
                position: end,
                tangent: axis,
                twist: 0.0,
            },
        ];
    }

    let u_i = rotation * start_displacement.translation() * scale;
    let r_i = rotation * start_displacement.rotation() * scale;
    let u_j = rotation * end_displacement.translation() * scale;
    let r_j = rotation * end_displacement.rotation() * scale;

    // Slopes: dv/dx = θ3 and dw/dx = -θ2.
    let v = [u_i.y, r_i.z, u_j.y, r_j.z];
    let w = [u_i.z, -r_i.y, u_j.z, -r_j.y];
    let to_global = rotation.transpose();
    let count = stations.max(2);

    (0..count)
        .map(|station| {
            let s = station as f64 / (count - 1) as f64;
            let x = s * length;
            let (h, dh) = hermite(s, length);

            let axial = (1.0 - s) * u_i.x + s * u_j.x;
            let local_position = Vector3::new(x + axial, dot4(&h, &v), dot4(&h, &w));

            let mut tangent = Vector3::new(length + (u_j.x - u_i.x), dot4(&dh, &v), dot4(&dh, &w));
            let norm = tangent.norm();
            if norm > 1.0e-9 {
                tangent /= norm;
            } else {
                tangent = Vector3::x();
            }

            Station {
                position: Point::from(origin + to_global * local_position),
                tangent: to_global * tangent,
                twist: (1.0 - s) * r_i.x + s * r_j.x,
            }
        })
        .collect()
}

/// Hermite basis values and their derivatives with respect to `s`.
fn hermite(s: f64, length: f64) -> ([f64; 4], [f64; 4]) {
    let s2 = s * s;
    let s3 = s2 * s;
    let x = s * length;
    let values = [
        1.0 - 3.0 * s2 + 2.0 * s3,
        x * (1.0 - s) * (1.0 - s),
        3.0 * s2 - 2.0 * s3,
        x * (s2 - s),
    ];
    let slopes = [
        -6.0 * s + 6.0 * s2,
        length * (1.0 - 4.0 * s + 3.0 * s2),
        6.0 * s - 6.0 * s2,
        length * (3.0 * s2 - 2.0 * s),
    ];
    (values, slopes)
}

fn dot4(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
