//! Natural modes, periods and mass participation.
//!
//! The generalized problem `K φ = ω² M φ` on the free degrees of freedom is
//! reduced to a standard symmetric one with the Cholesky factor of `M`, so
//! the recovered shapes are mass normalized (`φᵀ M φ = 1`).

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::errors::AnalysisError;
use crate::geometry::Displacement;

/// Eigenvalues below this (rad²/s²) are reported as rigid-body modes.
const RIGID_BODY_EIGENVALUE: f64 = 1.0e-6;

/// Share of the mass activated by one mode in each global direction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModalParticipation {
    /// Effective mass ratio along X.
    pub ux: f64,
    /// Effective mass ratio along Y.
    pub uy: f64,
    /// Effective mass ratio along Z.
    pub uz: f64,
    /// Cumulative ratio along X up to and including this mode.
    pub sum_ux: f64,
    /// Cumulative ratio along Y.
    pub sum_uy: f64,
    /// Cumulative ratio along Z.
    pub sum_uz: f64,
    /// Participation factor along X, normalized by the total mass.
    pub gamma_x: f64,
    /// Participation factor along Y.
    pub gamma_y: f64,
    /// Participation factor along Z.
    pub gamma_z: f64,
}

/// One natural mode of vibration.
#[derive(Clone, Debug, PartialEq)]
pub struct Mode {
    /// Mode number, starting at 1 for the lowest frequency.
    pub number: usize,
    /// Eigenvalue ω² in rad²/s².
    pub eigenvalue: f64,
    /// Circular frequency ω in rad/s; zero for rigid-body modes.
    pub angular_frequency: f64,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Period in seconds; infinite for rigid-body modes.
    pub period: f64,
    /// Mass participation of this mode.
    pub participation: ModalParticipation,
    /// Mass-normalized shape, with the largest component positive.
    pub shape: BTreeMap<NodeIndex, Displacement>,
}

/// Result of a modal analysis.
#[derive(Clone, Debug)]
pub struct ModalResults {
    dof_count: usize,
    free_dof_count: usize,
    modes: Vec<Mode>,
    assembled_mass: BTreeMap<NodeIndex, [f64; 6]>,
    total_mass: [f64; 3],
}

impl ModalResults {
    /// Combine solved eigenpairs with the mass matrices they came from.
    ///
    /// `order` lists the nodes in degree-of-freedom order and `pairs` holds
    /// eigenvalues with free-DOF shapes, sorted ascending.
    pub(crate) fn new(
        order: &[NodeIndex],
        free_dofs: &[usize],
        mass: &DMatrix<f64>,
        free_mass: &DMatrix<f64>,
        pairs: Vec<(f64, DVector<f64>)>,
    ) -> Self {
        let dof_count = mass.nrows();
        let influence: [DVector<f64>; 3] = std::array::from_fn(|axis| {
            let r = DVector::from_iterator(
                free_dofs.len(),
                free_dofs
                    .iter()
                    .map(|dof| if dof % 6 == axis { 1.0 } else { 0.0 }),
            );
            free_mass * r
        });
        let total_mass: [f64; 3] = std::array::from_fn(|axis| {
            influence[axis]
                .iter()
                .zip(free_dofs)
                .filter(|(_, dof)| *dof % 6 == axis)
                .map(|(value, _)| value)
                .sum()
        });

        let mut cumulative = [0.0; 3];
        let modes = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (eigenvalue, shape))| {
                let generalized = shape.dot(&(free_mass * &shape));
                let generalized = if generalized > 0.0 { generalized } else { 1.0 };
                let mut ratio = [0.0; 3];
                let mut gamma = [0.0; 3];
                for axis in 0..3 {
                    if total_mass[axis] > 0.0 {
                        let excitation = shape.dot(&influence[axis]);
                        ratio[axis] = excitation * excitation / (generalized * total_mass[axis]);
                        gamma[axis] = excitation / (total_mass[axis] * generalized).sqrt();
                        cumulative[axis] += ratio[axis];
                    }
                }

                let angular_frequency = if eigenvalue < RIGID_BODY_EIGENVALUE {
                    0.0
                } else {
                    eigenvalue.sqrt()
                };
                let frequency = angular_frequency / TAU;
                let period = if frequency > 0.0 {
                    frequency.recip()
                } else {
                    f64::INFINITY
                };
                debug!(mode = index + 1, eigenvalue, period, "recovered mode");

                let mut full = DVector::zeros(dof_count);
                for (value, &dof) in shape.iter().zip(free_dofs) {
                    full[dof] = *value;
                }
                let shape = order
                    .iter()
                    .enumerate()
                    .map(|(idx, node)| {
                        (*node, Displacement::from_dofs(&full.as_slice()[idx * 6..idx * 6 + 6]))
                    })
                    .collect();

                Mode {
                    number: index + 1,
                    eigenvalue,
                    angular_frequency,
                    frequency,
                    period,
                    participation: ModalParticipation {
                        ux: ratio[0],
                        uy: ratio[1],
                        uz: ratio[2],
                        sum_ux: cumulative[0],
                        sum_uy: cumulative[1],
                        sum_uz: cumulative[2],
                        gamma_x: gamma[0],
                        gamma_y: gamma[1],
                        gamma_z: gamma[2],
                    },
                    shape,
                }
            })
            .collect();

        let assembled_mass = order
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let base = idx * 6;
                (*node, std::array::from_fn(|i| mass[(base + i, base + i)]))
            })
            .collect();

        Self {
            dof_count,
            free_dof_count: free_dofs.len(),
            modes,
            assembled_mass,
            total_mass,
        }
    }

    /// Total number of degrees of freedom in the model.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        self.dof_count
    }

    /// Number of unrestrained degrees of freedom.
    #[must_use]
    pub fn free_dof_count(&self) -> usize {
        self.free_dof_count
    }

    /// Solved modes in ascending frequency.
    #[must_use]
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Mode by number, starting at 1.
    #[must_use]
    pub fn mode(&self, number: usize) -> Option<&Mode> {
        number.checked_sub(1).and_then(|index| self.modes.get(index))
    }

    /// Diagonal of the assembled mass matrix at a node.
    #[must_use]
    pub fn assembled_mass(&self, node: NodeIndex) -> Option<[f64; 6]> {
        self.assembled_mass.get(&node).copied()
    }

    /// Assembled mass diagonals of all nodes in index order.
    pub fn assembled_masses(&self) -> impl Iterator<Item = (NodeIndex, [f64; 6])> + '_ {
        self.assembled_mass.iter().map(|(node, mass)| (*node, *mass))
    }

    /// Mass free to move along global X, Y and Z in kilograms.
    #[must_use]
    pub fn total_mass(&self) -> [f64; 3] {
        self.total_mass
    }
}

/// Lowest `count` eigenpairs of `K φ = λ M φ` for symmetric `stiffness` and
/// positive definite `mass`.
pub(crate) fn solve_eigenpairs(
    stiffness: &DMatrix<f64>,
    mass: &DMatrix<f64>,
    count: usize,
) -> Result<Vec<(f64, DVector<f64>)>, AnalysisError> {
    let cholesky = mass.clone().cholesky().ok_or(AnalysisError::InvalidMassMatrix)?;
    let lower = cholesky.l();
    let half = lower
        .solve_lower_triangular(stiffness)
        .ok_or(AnalysisError::InvalidMassMatrix)?;
    let standard = lower
        .solve_lower_triangular(&half.transpose())
        .ok_or(AnalysisError::InvalidMassMatrix)?;
    let symmetric = (&standard + standard.transpose()) * 0.5;

    let eigen = SymmetricEigen::new(symmetric);
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|a, b| eigen.eigenvalues[*a].total_cmp(&eigen.eigenvalues[*b]));

    let upper = lower.transpose();
    order
        .into_iter()
        .take(count)
        .map(|index| -> Result<(f64, DVector<f64>), AnalysisError> {
            let reduced = eigen.eigenvectors.column(index).into_owned();
            let shape = upper
                .solve_upper_triangular(&reduced)
                .ok_or(AnalysisError::InvalidMassMatrix)?;
            Ok((eigen.eigenvalues[index], with_positive_peak(shape)))
        })
        .collect()
}

/// Flip the sign of a shape so its largest component is positive.
fn with_positive_peak(shape: DVector<f64>) -> DVector<f64> {
    let peak = shape.iter().fold(0.0_f64, |peak, value| {
        if value.abs() > peak.abs() {
            *value
        } else {
            peak
        }
    });
    if peak < 0.0 {
        -shape
    } else {
        shape
    }
}
