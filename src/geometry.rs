//! Fundamental geometric types for frame modelling.
//!
//! Every node carries six degrees of freedom ordered `[Ux, Uy, Uz, Rx, Ry, Rz]`.
//! Global Z points up, so gravity acts along -Z.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Position in three dimensional space measured in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
    /// Distance along the global Z axis.
    pub z: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f64>> for Point {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Point> for Vector3<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

/// Generalised nodal displacement: three translations in metres followed by
/// three rotations in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    /// Translation along global X.
    pub ux: f64,
    /// Translation along global Y.
    pub uy: f64,
    /// Translation along global Z.
    pub uz: f64,
    /// Rotation about global X.
    pub rx: f64,
    /// Rotation about global Y.
    pub ry: f64,
    /// Rotation about global Z.
    pub rz: f64,
}

impl Displacement {
    /// Create a [`Displacement`] from its six components.
    #[must_use]
    pub const fn new(ux: f64, uy: f64, uz: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Self {
            ux,
            uy,
            uz,
            rx,
            ry,
            rz,
        }
    }

    /// Build a displacement from a slice in degree-of-freedom order.
    ///
    /// Missing trailing entries are treated as zero.
    #[must_use]
    pub fn from_dofs(values: &[f64]) -> Self {
        let at = |idx: usize| values.get(idx).copied().unwrap_or(0.0);
        Self::new(at(0), at(1), at(2), at(3), at(4), at(5))
    }

    /// Return the components in degree-of-freedom order.
    #[must_use]
    pub const fn to_array(self) -> [f64; 6] {
        [self.ux, self.uy, self.uz, self.rx, self.ry, self.rz]
    }

    /// Translational part as an algebraic vector.
    #[must_use]
    pub fn translation(self) -> Vector3<f64> {
        Vector3::new(self.ux, self.uy, self.uz)
    }

    /// Rotational part as an algebraic vector.
    #[must_use]
    pub fn rotation(self) -> Vector3<f64> {
        Vector3::new(self.rx, self.ry, self.rz)
    }
}

/// A force and moment pair acting at a point, in newtons and newton-metres.
///
/// Used for applied nodal loads, support reactions and element end forces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Wrench {
    /// Force along X.
    pub fx: f64,
    /// Force along Y.
    pub fy: f64,
    /// Force along Z.
    pub fz: f64,
    /// Moment about X.
    pub mx: f64,
    /// Moment about Y.
    pub my: f64,
    /// Moment about Z.
    pub mz: f64,
}

impl Wrench {
    /// Create a [`Wrench`] from its six components.
    #[must_use]
    pub const fn new(fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64) -> Self {
        Self {
            fx,
            fy,
            fz,
            mx,
            my,
            mz,
        }
    }

    /// Create a pure force with no moment.
    #[must_use]
    pub const fn force(fx: f64, fy: f64, fz: f64) -> Self {
        Self::new(fx, fy, fz, 0.0, 0.0, 0.0)
    }

    /// Build a wrench from a slice in degree-of-freedom order.
    #[must_use]
    pub fn from_dofs(values: &[f64]) -> Self {
        let at = |idx: usize| values.get(idx).copied().unwrap_or(0.0);
        Self::new(at(0), at(1), at(2), at(3), at(4), at(5))
    }

    /// Return the components in degree-of-freedom order.
    #[must_use]
    pub const fn to_array(self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    /// Force part as an algebraic vector.
    #[must_use]
    pub fn force_vector(self) -> Vector3<f64> {
        Vector3::new(self.fx, self.fy, self.fz)
    }

    /// Moment part as an algebraic vector.
    #[must_use]
    pub fn moment_vector(self) -> Vector3<f64> {
        Vector3::new(self.mx, self.my, self.mz)
    }

    /// Transport this wrench from `position` to the global origin.
    ///
    /// The force is unchanged; the moment gains `r × F`.
    #[must_use]
    pub fn about_origin(self, position: Point) -> Self {
        let arm = position.to_vector();
        let force = self.force_vector();
        let moment = self.moment_vector() + arm.cross(&force);
        Self::new(force.x, force.y, force.z, moment.x, moment.y, moment.z)
    }

    /// Largest absolute component.
    #[must_use]
    pub fn max_abs(self) -> f64 {
        self.to_array()
            .iter()
            .fold(0.0_f64, |acc, value| acc.max(value.abs()))
    }

    /// Scale every component by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        let [fx, fy, fz, mx, my, mz] = self.to_array();
        Self::new(
            fx * factor,
            fy * factor,
            fz * factor,
            mx * factor,
            my * factor,
            mz * factor,
        )
    }
}

impl std::ops::Add for Wrench {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.fx + rhs.fx,
            self.fy + rhs.fy,
            self.fz + rhs.fz,
            self.mx + rhs.mx,
            self.my + rhs.my,
            self.mz + rhs.mz,
        )
    }
}

impl std::ops::AddAssign for Wrench {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use framex::point;
///
/// let origin = point(0.0, 0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// Convenience helper for creating a force-only [`Wrench`].
///
/// # Examples
/// ```
/// use framex::force;
///
/// let load = force(1.0, 0.0, -5.0);
/// assert_eq!(load.fz, -5.0);
/// assert_eq!(load.mx, 0.0);
/// ```
#[must_use]
pub const fn force(x: f64, y: f64, z: f64) -> Wrench {
    Wrench::force(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_to_vector_roundtrip() {
        let origin = Point::new(1.0, 2.0, 3.0);
        let vector: Vector3<f64> = origin.into();
        assert_eq!(vector, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(Point::from(vector), origin);
    }

    #[test]
    fn short_dof_slices_pad_with_zero() {
        let displacement = Displacement::from_dofs(&[0.1, -0.2]);
        assert_eq!(displacement, Displacement::new(0.1, -0.2, 0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn wrench_about_origin_adds_lever_arm_moment() {
        let load = Wrench::force(0.0, 0.0, -10.0);
        let moved = load.about_origin(point(2.0, 0.0, 0.0));
        assert_eq!(moved.fz, -10.0);
        // r × F = (2, 0, 0) × (0, 0, -10) = (0, 20, 0)
        assert_eq!(moved.my, 20.0);
        assert_eq!(moved.mx, 0.0);
        assert_eq!(moved.mz, 0.0);
    }

    #[test]
    fn wrench_addition_and_max() {
        let total = Wrench::force(1.0, -4.0, 0.0) + Wrench::new(0.0, 0.0, 0.0, 0.5, 0.0, 0.0);
        assert_eq!(total.max_abs(), 4.0);
        assert_eq!(total.scaled(2.0).fy, -8.0);
    }
}
