//! Results of a linear static analysis.

use std::collections::BTreeMap;

use nalgebra::Matrix3;
use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::{info, warn};

use crate::deflection::{deflected_shape, Station};
use crate::element::{Matrix12, Vector12};
use crate::frame::Restraint;
use crate::geometry::{Displacement, Point, Wrench};

/// Residuals below this fraction of the largest applied component count as balanced.
pub const EQUILIBRIUM_TOLERANCE: f64 = 1.0e-6;

/// Solved state of one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeResult {
    /// Undeformed position.
    pub position: Point,
    /// Restrained degrees of freedom.
    pub restraint: Restraint,
    /// Solved displacement.
    pub displacement: Displacement,
    /// Support reaction; zero on free degrees of freedom.
    pub reaction: Wrench,
    /// Equivalent nodal load, including the effect of member loads.
    pub applied: Wrench,
}

/// Element matrices and forces exposed for inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementResult {
    /// Start node.
    pub start: NodeIndex,
    /// End node.
    pub end: NodeIndex,
    /// Rows are the local axes in global coordinates.
    pub rotation: Matrix3<f64>,
    /// Local stiffness after release condensation.
    pub local_stiffness: Matrix12,
    /// Transformation from global node displacements to local end displacements.
    pub transformation: Matrix12,
    /// Local fixed-end forces after release condensation.
    pub fixed_end_forces: Vector12,
    /// Local end forces `k T u + FEF`.
    pub end_forces: Vector12,
    /// Centre-to-centre length.
    pub total_length: f64,
    /// Length between rigid end zones.
    pub clear_length: f64,
}

impl ElementResult {
    /// End forces at the start in local `[P, V2, V3, T, M2, M3]` order.
    #[must_use]
    pub fn start_forces(&self) -> Wrench {
        Wrench::from_dofs(&self.end_forces.as_slice()[..6])
    }

    /// End forces at the end in local `[P, V2, V3, T, M2, M3]` order.
    #[must_use]
    pub fn end_forces(&self) -> Wrench {
        Wrench::from_dofs(&self.end_forces.as_slice()[6..])
    }
}

/// Global balance between applied loads and reactions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquilibriumCheck {
    /// Resultant of the equivalent nodal loads about the origin.
    pub applied: Wrench,
    /// Resultant of the reactions about the origin.
    pub reaction: Wrench,
    /// `applied + reaction`; zero for a balanced solution.
    pub residual: Wrench,
    /// Whether every residual component is within tolerance.
    pub balanced: bool,
}

impl EquilibriumCheck {
    fn from_nodes<'a>(nodes: impl Iterator<Item = &'a NodeResult>) -> Self {
        let mut applied = Wrench::default();
        let mut reaction = Wrench::default();
        for node in nodes {
            applied += node.applied.about_origin(node.position);
            reaction += node.reaction.about_origin(node.position);
        }
        let residual = applied + reaction;
        let balanced = residual.max_abs() <= EQUILIBRIUM_TOLERANCE * applied.max_abs();
        Self {
            applied,
            reaction,
            residual,
            balanced,
        }
    }
}

/// Displacements, reactions and element forces for one load case.
#[derive(Clone, Debug)]
pub struct AnalysisResults {
    case: String,
    dof_count: usize,
    nodes: BTreeMap<NodeIndex, NodeResult>,
    elements: BTreeMap<EdgeIndex, ElementResult>,
    equilibrium: EquilibriumCheck,
}

impl AnalysisResults {
    pub(crate) fn new(
        case: &str,
        dof_count: usize,
        nodes: BTreeMap<NodeIndex, NodeResult>,
        elements: BTreeMap<EdgeIndex, ElementResult>,
    ) -> Self {
        let equilibrium = EquilibriumCheck::from_nodes(nodes.values());
        if equilibrium.balanced {
            info!(case, residual = equilibrium.residual.max_abs(), "equilibrium satisfied");
        } else {
            warn!(case, residual = ?equilibrium.residual, "equilibrium residual exceeds tolerance");
        }
        Self {
            case: case.to_owned(),
            dof_count,
            nodes,
            elements,
            equilibrium,
        }
    }

    /// Name of the analysed load case.
    #[must_use]
    pub fn case(&self) -> &str {
        &self.case
    }

    /// Total number of degrees of freedom in the model.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        self.dof_count
    }

    /// Results of a node.
    #[must_use]
    pub fn node(&self, node: NodeIndex) -> Option<&NodeResult> {
        self.nodes.get(&node)
    }

    /// All node results in index order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &NodeResult)> {
        self.nodes.iter().map(|(index, result)| (*index, result))
    }

    /// Displacement of a node.
    #[must_use]
    pub fn displacement(&self, node: NodeIndex) -> Option<Displacement> {
        self.nodes.get(&node).map(|result| result.displacement)
    }

    /// Reaction at a node.
    #[must_use]
    pub fn reaction(&self, node: NodeIndex) -> Option<Wrench> {
        self.nodes.get(&node).map(|result| result.reaction)
    }

    /// Results of an element.
    #[must_use]
    pub fn element(&self, element: EdgeIndex) -> Option<&ElementResult> {
        self.elements.get(&element)
    }

    /// All element results in index order.
    pub fn elements(&self) -> impl Iterator<Item = (EdgeIndex, &ElementResult)> {
        self.elements.iter().map(|(index, result)| (*index, result))
    }

    /// Sum of all reactions with moments taken about the global origin.
    #[must_use]
    pub fn base_reaction(&self) -> Wrench {
        self.equilibrium.reaction
    }

    /// Global equilibrium check.
    #[must_use]
    pub fn equilibrium(&self) -> &EquilibriumCheck {
        &self.equilibrium
    }

    /// Largest absolute displacement component over all nodes.
    #[must_use]
    pub fn max_displacement(&self) -> f64 {
        self.nodes
            .values()
            .flat_map(|node| node.displacement.to_array())
            .fold(0.0, |acc: f64, value| acc.max(value.abs()))
    }

    /// Deflected shape of an element with displacements multiplied by `scale`.
    #[must_use]
    pub fn deflected_shape(
        &self,
        element: EdgeIndex,
        scale: f64,
        stations: usize,
    ) -> Option<Vec<Station>> {
        let result = self.elements.get(&element)?;
        let start = self.nodes.get(&result.start)?;
        let end = self.nodes.get(&result.end)?;
        Some(deflected_shape(
            start.position,
            end.position,
            &result.rotation,
            start.displacement,
            end.displacement,
            scale,
            stations,
        ))
    }
}
