//! Element-level matrices for 3D Timoshenko frame elements.
//!
//! Local degrees of freedom follow the node order `[u1, u2, u3, r1, r2, r3]` at
//! the start node followed by the same six at the end node, where axis 1 runs
//! along the member. The global stiffness of an element is `Tᵀ k T` with
//! `T = T_ecc · T_rot`.

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};
use petgraph::graph::EdgeIndex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AnalysisError;
use crate::geometry::Point;
use crate::section::{Material, SectionProperties};

/// 12x12 element matrix.
pub type Matrix12 = SMatrix<f64, 12, 12>;

/// 12 component element vector.
pub type Vector12 = SVector<f64, 12>;

/// Elements shorter than this are treated as connecting coincident points.
pub const MIN_ELEMENT_LENGTH: f64 = 1.0e-9;

/// Local rotational degrees of freedom that receive a penalty stiffness when released.
const ROTATIONAL_DOFS: [usize; 6] = [3, 4, 5, 9, 10, 11];

/// Relative size of the penalty stiffness placed on released rotations.
const RELEASE_PENALTY: f64 = 1.0e-8;

/// Member end releases.
///
/// Each array is indexed in local order `[P, V2, V3, T, M2, M3]`; `true` frees
/// the corresponding internal force at that end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndReleases {
    /// Releases at the start node.
    #[serde(default)]
    pub start: [bool; 6],
    /// Releases at the end node.
    #[serde(default)]
    pub end: [bool; 6],
}

impl EndReleases {
    /// Fully continuous element.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            start: [false; 6],
            end: [false; 6],
        }
    }

    /// Both bending moments released at both ends, leaving torsion continuous.
    #[must_use]
    pub const fn pinned() -> Self {
        let moments = [false, false, false, false, true, true];
        Self {
            start: moments,
            end: moments,
        }
    }

    /// Whether any degree of freedom is released.
    #[must_use]
    pub fn any(&self) -> bool {
        self.start.iter().chain(self.end.iter()).any(|released| *released)
    }

    /// Releases flattened into element degree-of-freedom order.
    #[must_use]
    pub fn to_dofs(&self) -> [bool; 12] {
        let mut dofs = [false; 12];
        dofs[..6].copy_from_slice(&self.start);
        dofs[6..].copy_from_slice(&self.end);
        dofs
    }
}

/// Shear deformation parameter `φ = 12 EI / (G As L²)`; zero when the shear area is zero.
#[must_use]
pub fn shear_deformation_factor(
    flexural_rigidity: f64,
    shear_modulus: f64,
    shear_area: f64,
    length: f64,
) -> f64 {
    if shear_area > 0.0 {
        12.0 * flexural_rigidity / (shear_modulus * shear_area * length * length)
    } else {
        0.0
    }
}

/// Local 12x12 Timoshenko stiffness matrix.
///
/// Bending and shear use `clear_length`; axial and torsional terms use the
/// centre-to-centre `total_length`.
///
/// # Examples
/// ```
/// use framex::element::local_stiffness;
/// use framex::{Material, SectionProperties};
///
/// let steel = Material::new(200.0e9, 0.3, 0.0).unwrap();
/// let props = SectionProperties::new(0.01, 1.0e-6, 8.0e-5, 2.0e-5, 0.0, 0.0);
/// let k = local_stiffness(&steel, &props, 2.0, 2.0);
/// assert!((k[(0, 0)] - 200.0e9 * 0.01 / 2.0).abs() < 1.0);
/// assert_eq!(k, k.transpose());
/// ```
#[must_use]
pub fn local_stiffness(
    material: &Material,
    properties: &SectionProperties,
    clear_length: f64,
    total_length: f64,
) -> Matrix12 {
    let e = material.elastic_modulus;
    let g = material.shear_modulus();
    let l = clear_length;
    let mut k = Matrix12::zeros();

    let axial = e * properties.area / total_length;
    let torsion = g * properties.torsion_constant / total_length;
    for (dof, value) in [(0, axial), (3, torsion)] {
        k[(dof, dof)] = value;
        k[(dof, dof + 6)] = -value;
        k[(dof + 6, dof)] = -value;
        k[(dof + 6, dof + 6)] = value;
    }

    // Bending in the 1-2 plane: displacement u2 with rotation r3.
    let ei = e * properties.i33;
    let phi = shear_deformation_factor(ei, g, properties.shear_area_2, l);
    let [k1, k2, k3, k4] = bending_terms(ei, phi, l);
    let entries = [
        (1, 1, k1),
        (1, 5, k2),
        (1, 7, -k1),
        (1, 11, k2),
        (5, 5, k3),
        (5, 7, -k2),
        (5, 11, k4),
        (7, 7, k1),
        (7, 11, -k2),
        (11, 11, k3),
    ];
    set_symmetric(&mut k, &entries);

    // Bending in the 1-3 plane: displacement u3 with rotation r2, opposite sign coupling.
    let ei = e * properties.i22;
    let phi = shear_deformation_factor(ei, g, properties.shear_area_3, l);
    let [k1, k2, k3, k4] = bending_terms(ei, phi, l);
    let entries = [
        (2, 2, k1),
        (2, 4, -k2),
        (2, 8, -k1),
        (2, 10, -k2),
        (4, 4, k3),
        (4, 8, k2),
        (4, 10, k4),
        (8, 8, k1),
        (8, 10, k2),
        (10, 10, k3),
    ];
    set_symmetric(&mut k, &entries);

    k
}

/// Shear, coupling, direct and carry-over bending stiffness terms.
fn bending_terms(ei: f64, phi: f64, l: f64) -> [f64; 4] {
    let p = 1.0 + phi;
    [
        12.0 * ei / (l * l * l * p),
        6.0 * ei / (l * l * p),
        (4.0 + phi) * ei / (l * p),
        (2.0 - phi) * ei / (l * p),
    ]
}

/// Write upper-triangle entries and mirror them.
fn set_symmetric(k: &mut Matrix12, entries: &[(usize, usize, f64)]) {
    for &(row, col, value) in entries {
        k[(row, col)] = value;
        k[(col, row)] = value;
    }
}

/// Rotation matrix whose rows are the local axes expressed in global coordinates.
///
/// Local 1 runs from `start` to `end`. The reference vector is global Z, or
/// global X for members within about 2.6° of vertical. `beta_degrees` rotates
/// local 2 and 3 about local 1.
#[must_use]
pub fn rotation_matrix(start: &Vector3<f64>, end: &Vector3<f64>, beta_degrees: f64) -> Matrix3<f64> {
    let axis = end - start;
    let length = axis.norm();
    if length == 0.0 {
        return Matrix3::identity();
    }
    let vx = axis / length;
    let reference = if vx.z.abs() > 0.999 {
        Vector3::x()
    } else {
        Vector3::z()
    };
    let vy = reference.cross(&vx).normalize();
    let vz = vx.cross(&vy);

    let (s, c) = beta_degrees.to_radians().sin_cos();
    let vy_rotated = vy * c + vz * s;
    let vz_rotated = -vy * s + vz * c;

    Matrix3::from_rows(&[
        vx.transpose(),
        vy_rotated.transpose(),
        vz_rotated.transpose(),
    ])
}

/// Block-diagonal 12x12 rotation built from four copies of `rotation`.
#[must_use]
pub fn block_rotation(rotation: &Matrix3<f64>) -> Matrix12 {
    let mut t = Matrix12::zeros();
    for block in 0..4 {
        t.fixed_view_mut::<3, 3>(block * 3, block * 3)
            .copy_from(rotation);
    }
    t
}

/// Rigid-link transformation from node displacements to element end displacements.
///
/// Offsets are local vectors from each node to the corresponding element end.
#[must_use]
pub fn eccentricity_matrix(start: &Vector3<f64>, end: &Vector3<f64>) -> Matrix12 {
    let mut t = Matrix12::identity();
    for (base, offset) in [(0, start), (6, end)] {
        let (ex, ey, ez) = (offset.x, offset.y, offset.z);
        t[(base, base + 4)] = ez;
        t[(base, base + 5)] = -ey;
        t[(base + 1, base + 3)] = -ez;
        t[(base + 1, base + 5)] = ex;
        t[(base + 2, base + 3)] = ey;
        t[(base + 2, base + 4)] = -ex;
    }
    t
}

/// Split element degrees of freedom into kept and released lists.
fn partition(released: &[bool; 12]) -> (Vec<usize>, Vec<usize>) {
    (0..12).partition(|dof| !released[*dof])
}

/// Copy a block of `k` into a dynamic matrix.
fn submatrix(k: &Matrix12, rows: &[usize], cols: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), cols.len(), |r, c| k[(rows[r], cols[c])])
}

/// Statically condense released degrees of freedom out of `k`.
///
/// Released rotations keep a small penalty on the diagonal so that nodes
/// connected only through released rotations stay solvable. Returns `None`
/// when the released block is singular.
#[must_use]
pub fn condense_stiffness(k: &Matrix12, released: &[bool; 12]) -> Option<Matrix12> {
    let (kept, condensed) = partition(released);
    if condensed.is_empty() {
        return Some(*k);
    }
    let k_rr = submatrix(k, &kept, &kept);
    let k_rc = submatrix(k, &kept, &condensed);
    let k_cr = submatrix(k, &condensed, &kept);
    let k_cc_inv = submatrix(k, &condensed, &condensed).try_inverse()?;
    let reduced = k_rr - &k_rc * &k_cc_inv * &k_cr;
    if reduced.iter().any(|value| !value.is_finite()) {
        return None;
    }

    let mut result = Matrix12::zeros();
    for (r, &row) in kept.iter().enumerate() {
        for (c, &col) in kept.iter().enumerate() {
            result[(row, col)] = reduced[(r, c)];
        }
    }
    let penalty = k.amax() * RELEASE_PENALTY;
    for dof in condensed {
        if ROTATIONAL_DOFS.contains(&dof) {
            result[(dof, dof)] += penalty;
        }
    }
    Some(result)
}

/// Move fixed-end forces away from released degrees of freedom.
///
/// `k` must be the uncondensed local stiffness. Returns `None` when the
/// released block is singular.
#[must_use]
pub fn condense_fixed_end_forces(
    k: &Matrix12,
    fixed_end_forces: &Vector12,
    released: &[bool; 12],
) -> Option<Vector12> {
    let (kept, condensed) = partition(released);
    if condensed.is_empty() {
        return Some(*fixed_end_forces);
    }
    let k_kc = submatrix(k, &kept, &condensed);
    let k_cc_inv = submatrix(k, &condensed, &condensed).try_inverse()?;
    let f_c = DVector::from_iterator(
        condensed.len(),
        condensed.iter().map(|dof| fixed_end_forces[*dof]),
    );
    let correction = k_kc * (k_cc_inv * f_c);

    let mut result = Vector12::zeros();
    for (idx, &dof) in kept.iter().enumerate() {
        result[dof] = fixed_end_forces[dof] - correction[idx];
    }
    Some(result)
}

/// Geometric description of an element before section data is attached.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ElementLayout {
    /// Position of the start node.
    pub(crate) start: Point,
    /// Position of the end node.
    pub(crate) end: Point,
    /// Global joint offsets from each node to the element end.
    pub(crate) joint_offsets: [Vector3<f64>; 2],
    /// Rigid end zone lengths measured along the member.
    pub(crate) end_offsets: [f64; 2],
    /// Rotation of the local 2-3 axes about local 1 in degrees.
    pub(crate) beta: f64,
    /// Local `(e2, e3)` offset from the node to the centroid.
    pub(crate) insertion: (f64, f64),
    /// End releases.
    pub(crate) releases: EndReleases,
}

/// Element with all matrices needed for assembly and recovery.
#[derive(Clone, Debug)]
pub(crate) struct PreparedElement {
    /// Graph identifier, used for error reporting.
    pub(crate) id: EdgeIndex,
    /// Material constants.
    pub(crate) material: Material,
    /// Section properties.
    pub(crate) properties: SectionProperties,
    /// Rows are the local axes in global coordinates.
    pub(crate) rotation: Matrix3<f64>,
    /// Centre-to-centre length.
    pub(crate) total_length: f64,
    /// Length between rigid end zones.
    pub(crate) clear_length: f64,
    /// Rigid end zone lengths.
    pub(crate) end_offsets: [f64; 2],
    /// Local offsets from each node to the section centroid, excluding rigid zones.
    pub(crate) insertion_offsets: [Vector3<f64>; 2],
    /// End releases.
    pub(crate) releases: EndReleases,
    /// Local stiffness before condensation.
    pub(crate) raw_stiffness: Matrix12,
    /// Local stiffness after condensation of releases.
    pub(crate) stiffness: Matrix12,
    /// Combined eccentricity and rotation transformation.
    pub(crate) transformation: Matrix12,
}

impl PreparedElement {
    /// Build the element matrices.
    pub(crate) fn new(
        id: EdgeIndex,
        layout: &ElementLayout,
        material: Material,
        properties: SectionProperties,
    ) -> Result<Self, AnalysisError> {
        let start = layout.start.to_vector() + layout.joint_offsets[0];
        let end = layout.end.to_vector() + layout.joint_offsets[1];
        let total_length = (end - start).norm();
        if total_length < MIN_ELEMENT_LENGTH {
            return Err(AnalysisError::ZeroLengthElement(id));
        }
        let [start_rigid, end_rigid] = layout.end_offsets;
        let clear_length = total_length - start_rigid - end_rigid;
        if clear_length <= 0.0 {
            return Err(AnalysisError::NonPositiveClearLength {
                element: id,
                clear_length,
            });
        }

        let rotation = rotation_matrix(&start, &end, layout.beta);
        let (e2, e3) = layout.insertion;
        let insertion = Vector3::new(0.0, e2, e3);
        let insertion_offsets = [
            rotation * layout.joint_offsets[0] + insertion,
            rotation * layout.joint_offsets[1] + insertion,
        ];
        let mut start_link = insertion_offsets[0];
        start_link.x += start_rigid;
        let mut end_link = insertion_offsets[1];
        end_link.x -= end_rigid;
        let transformation =
            eccentricity_matrix(&start_link, &end_link) * block_rotation(&rotation);

        let raw_stiffness = local_stiffness(&material, &properties, clear_length, total_length);
        let stiffness = condense_stiffness(&raw_stiffness, &layout.releases.to_dofs())
            .ok_or(AnalysisError::UnstableRelease(id))?;

        debug!(
            element = id.index(),
            total_length,
            clear_length,
            local_x = ?rotation.row(0),
            local_y = ?rotation.row(1),
            local_z = ?rotation.row(2),
            "prepared element"
        );

        Ok(Self {
            id,
            material,
            properties,
            rotation,
            total_length,
            clear_length,
            end_offsets: layout.end_offsets,
            insertion_offsets,
            releases: layout.releases,
            raw_stiffness,
            stiffness,
            transformation,
        })
    }

    /// Element stiffness in global coordinates at the node degrees of freedom.
    pub(crate) fn global_stiffness(&self) -> Matrix12 {
        self.transformation.transpose() * self.stiffness * self.transformation
    }

    /// Apply release condensation to accumulated local fixed-end forces.
    pub(crate) fn condense_loads(&self, fixed_end_forces: &Vector12) -> Result<Vector12, AnalysisError> {
        if !self.releases.any() {
            return Ok(*fixed_end_forces);
        }
        condense_fixed_end_forces(
            &self.raw_stiffness,
            fixed_end_forces,
            &self.releases.to_dofs(),
        )
        .ok_or(AnalysisError::UnstableRelease(self.id))
    }

    /// Local end forces `k T u + FEF` from global node displacements.
    pub(crate) fn end_forces(&self, displacements: &Vector12, fixed_end_forces: &Vector12) -> Vector12 {
        self.stiffness * (self.transformation * displacements) + fixed_end_forces
    }
}
