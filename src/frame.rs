//! Frame model storage, editing and linear static solution.

use std::collections::{BTreeMap, HashMap};

use nalgebra::{DMatrix, DVector, Vector3};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::element::{ElementLayout, EndReleases, PreparedElement, Vector12};
use crate::errors::{AnalysisError, FrameEditError};
use crate::geometry::{Displacement, Point, Wrench};
use crate::loads::{
    member_load_effect, rigid_zone_loads, CoordinateSystem, LoadCase, LoadPattern, LoadPosition,
    MemberLoad,
};
use crate::mass::{global_element_mass, point_mass, MassSource, GRAVITY};
use crate::modal::{solve_eigenpairs, ModalResults};
use crate::results::{AnalysisResults, ElementResult, NodeResult};
use crate::section::{CardinalPoint, Material, Section};

/// Displacement components above this magnitude mark the structure as unstable.
pub const DISPLACEMENT_LIMIT: f64 = 1.0e6;

/// Pivots smaller than this fraction of the largest stiffness term mark a mechanism.
const SINGULAR_PIVOT_RATIO: f64 = 1.0e-12;

/// Self weight intensities below this (N/m) are not generated.
const MIN_SELF_WEIGHT: f64 = 1.0e-9;

/// Restrained degrees of freedom of a node in `[Ux, Uy, Uz, Rx, Ry, Rz]` order.
///
/// # Examples
/// ```
/// use framex::Restraint;
///
/// assert!(Restraint::PINNED.0[2]);
/// assert!(!Restraint::PINNED.0[5]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Restraint(pub [bool; 6]);

impl Restraint {
    /// No restraint.
    pub const FREE: Self = Self([false; 6]);
    /// All six degrees of freedom restrained.
    pub const FIXED: Self = Self([true; 6]);
    /// Translations restrained, rotations free.
    pub const PINNED: Self = Self([true, true, true, false, false, false]);
    /// Vertical translation restrained only.
    pub const ROLLER: Self = Self([false, false, true, false, false, false]);

    /// Whether any degree of freedom is restrained.
    #[must_use]
    pub fn is_support(self) -> bool {
        self.0.iter().any(|fixed| *fixed)
    }
}

/// Internal representation of a frame joint.
#[derive(Clone, Debug)]
struct Joint {
    /// Position of the joint in metres.
    position: Point,
    /// Restrained degrees of freedom.
    restraint: Restraint,
    /// Applied loads keyed by pattern name.
    loads: Vec<(String, Wrench)>,
}

impl Joint {
    fn new(position: Point) -> Self {
        Self {
            position,
            restraint: Restraint::FREE,
            loads: Vec::new(),
        }
    }
}

/// Internal representation of a frame element.
#[derive(Clone, Debug)]
struct FrameElement {
    /// Name of the assigned section.
    section: String,
    releases: EndReleases,
    /// Local axis rotation in degrees.
    beta: f64,
    /// Global offsets from each node to the element end.
    joint_offsets: [Vector3<f64>; 2],
    /// Rigid zone lengths at each end.
    end_offsets: [f64; 2],
    cardinal: CardinalPoint,
    /// Member loads keyed by pattern name.
    loads: Vec<(String, MemberLoad)>,
}

impl FrameElement {
    fn new(section: &str) -> Self {
        Self {
            section: section.to_owned(),
            releases: EndReleases::none(),
            beta: 0.0,
            joint_offsets: [Vector3::zeros(); 2],
            end_offsets: [0.0; 2],
            cardinal: CardinalPoint::Centroid,
            loads: Vec::new(),
        }
    }
}

/// Element prepared for one solution together with its end nodes.
struct Assembled {
    start: NodeIndex,
    end: NodeIndex,
    element: PreparedElement,
}

/// Container for a 3D frame model and its cached analysis results.
#[derive(Debug, Default)]
pub struct Frame {
    /// Underlying graph storage for joints and elements.
    graph: Graph<Joint, FrameElement>,
    materials: BTreeMap<String, Material>,
    sections: BTreeMap<String, Section>,
    patterns: BTreeMap<String, LoadPattern>,
    cases: BTreeMap<String, LoadCase>,
    /// Results per load case, cleared by every edit.
    results: HashMap<String, AnalysisResults>,
}

impl Frame {
    /// Create an empty frame.
    ///
    /// # Examples
    /// ```
    /// use framex::Frame;
    ///
    /// let frame = Frame::new();
    /// assert_eq!(frame.node_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of nodes in the frame.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of elements in the frame.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Position of a node.
    #[must_use]
    pub fn node_position(&self, node: NodeIndex) -> Option<Point> {
        self.graph.node_weight(node).map(|joint| joint.position)
    }

    /// Restraint of a node.
    #[must_use]
    pub fn restraint(&self, node: NodeIndex) -> Option<Restraint> {
        self.graph.node_weight(node).map(|joint| joint.restraint)
    }

    /// Start and end node of an element.
    #[must_use]
    pub fn element_nodes(&self, element: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(element)
    }

    /// Name of the section assigned to an element.
    #[must_use]
    pub fn element_section(&self, element: EdgeIndex) -> Option<&str> {
        self.graph
            .edge_weight(element)
            .map(|data| data.section.as_str())
    }

    /// Registered material by name.
    #[must_use]
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Registered section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Registered load case by name.
    #[must_use]
    pub fn load_case(&self, name: &str) -> Option<&LoadCase> {
        self.cases.get(name)
    }

    /// Names of all load cases in alphabetical order.
    pub fn load_case_names(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    /// Add a new node to the frame.
    ///
    /// # Examples
    /// ```
    /// use framex::{point, Frame};
    ///
    /// let mut frame = Frame::new();
    /// let node = frame.add_node(point(0.0, 0.0, 3.0));
    /// assert_eq!(frame.node_count(), 1);
    /// assert_eq!(node.index(), 0);
    /// ```
    pub fn add_node(&mut self, position: Point) -> NodeIndex {
        self.invalidate();
        self.graph.add_node(Joint::new(position))
    }

    /// Update the position of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownNode`] when `node` is not part of this frame.
    pub fn move_node(&mut self, node: NodeIndex, position: Point) -> Result<(), FrameEditError> {
        self.joint_mut(node)?.position = position;
        Ok(())
    }

    /// Remove a node and all connected elements.
    ///
    /// Like every graph removal this may renumber the last node.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownNode`] when `node` is not part of this frame.
    pub fn remove_node(&mut self, node: NodeIndex) -> Result<(), FrameEditError> {
        if self.graph.node_weight(node).is_none() {
            return Err(FrameEditError::UnknownNode(node));
        }
        self.invalidate();
        self.graph
            .remove_node(node)
            .map(|_| ())
            .ok_or(FrameEditError::UnknownNode(node))
    }

    /// Set the restraint of a node.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownNode`] when `node` is not part of this frame.
    pub fn set_restraint(
        &mut self,
        node: NodeIndex,
        restraint: Restraint,
    ) -> Result<(), FrameEditError> {
        self.joint_mut(node)?.restraint = restraint;
        Ok(())
    }

    /// Register or replace a material.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::InvalidProperty`] when the material is not physical.
    pub fn add_material(
        &mut self,
        name: impl Into<String>,
        material: Material,
    ) -> Result<(), FrameEditError> {
        material.validate()?;
        self.invalidate();
        self.materials.insert(name.into(), material);
        Ok(())
    }

    /// Register or replace a section.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownMaterial`] when the section's material is not
    /// registered and [`FrameEditError::InvalidProperty`] for invalid properties.
    pub fn add_section(
        &mut self,
        name: impl Into<String>,
        section: Section,
    ) -> Result<(), FrameEditError> {
        if !self.materials.contains_key(&section.material) {
            return Err(FrameEditError::UnknownMaterial(section.material));
        }
        section.properties.validate()?;
        self.invalidate();
        self.sections.insert(name.into(), section);
        Ok(())
    }

    /// Connect two nodes with a new element using a registered section.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownNode`] for a missing end node and
    /// [`FrameEditError::UnknownSection`] for an unregistered section.
    pub fn add_element(
        &mut self,
        start: NodeIndex,
        end: NodeIndex,
        section: &str,
    ) -> Result<EdgeIndex, FrameEditError> {
        for node in [start, end] {
            if self.graph.node_weight(node).is_none() {
                return Err(FrameEditError::UnknownNode(node));
            }
        }
        if !self.sections.contains_key(section) {
            return Err(FrameEditError::UnknownSection(section.to_owned()));
        }
        self.invalidate();
        Ok(self.graph.add_edge(start, end, FrameElement::new(section)))
    }

    /// Remove an element from the frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownElement`] when `element` is not part of this frame.
    pub fn remove_element(&mut self, element: EdgeIndex) -> Result<(), FrameEditError> {
        if self.graph.edge_weight(element).is_none() {
            return Err(FrameEditError::UnknownElement(element));
        }
        self.invalidate();
        self.graph
            .remove_edge(element)
            .map(|_| ())
            .ok_or(FrameEditError::UnknownElement(element))
    }

    /// Assign a registered section to an element.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownElement`] or [`FrameEditError::UnknownSection`].
    pub fn set_section(&mut self, element: EdgeIndex, section: &str) -> Result<(), FrameEditError> {
        if !self.sections.contains_key(section) {
            return Err(FrameEditError::UnknownSection(section.to_owned()));
        }
        self.element_mut(element)?.section = section.to_owned();
        Ok(())
    }

    /// Set the end releases of an element.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownElement`] when `element` is not part of this frame.
    pub fn set_releases(
        &mut self,
        element: EdgeIndex,
        releases: EndReleases,
    ) -> Result<(), FrameEditError> {
        self.element_mut(element)?.releases = releases;
        Ok(())
    }

    /// Rotate the local 2-3 axes of an element about its axis, in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownElement`] when `element` is not part of this frame.
    pub fn set_beta_angle(&mut self, element: EdgeIndex, degrees: f64) -> Result<(), FrameEditError> {
        self.element_mut(element)?.beta = degrees;
        Ok(())
    }

    /// Set global offsets from the start and end nodes to the element ends.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownElement`] when `element` is not part of this frame.
    pub fn set_joint_offsets(
        &mut self,
        element: EdgeIndex,
        start: Point,
        end: Point,
    ) -> Result<(), FrameEditError> {
        self.element_mut(element)?.joint_offsets = [start.to_vector(), end.to_vector()];
        Ok(())
    }

    /// Set the rigid end zone lengths at the start and end of an element.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::InvalidEndOffset`] for a negative or non-finite
    /// length and [`FrameEditError::UnknownElement`] for an unknown element.
    pub fn set_end_offsets(
        &mut self,
        element: EdgeIndex,
        start: f64,
        end: f64,
    ) -> Result<(), FrameEditError> {
        for offset in [start, end] {
            if !offset.is_finite() || offset < 0.0 {
                return Err(FrameEditError::InvalidEndOffset(offset));
            }
        }
        self.element_mut(element)?.end_offsets = [start, end];
        Ok(())
    }

    /// Set the insertion point of an element.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownElement`] when `element` is not part of this frame.
    pub fn set_cardinal_point(
        &mut self,
        element: EdgeIndex,
        cardinal: CardinalPoint,
    ) -> Result<(), FrameEditError> {
        self.element_mut(element)?.cardinal = cardinal;
        Ok(())
    }

    /// Register or replace a load pattern.
    ///
    /// A load case with the same name and a unit scale factor is created unless
    /// one already exists.
    pub fn add_load_pattern(&mut self, name: impl Into<String>, pattern: LoadPattern) {
        let name = name.into();
        self.invalidate();
        self.cases
            .entry(name.clone())
            .or_insert_with(|| LoadCase::new().with_pattern(name.clone(), 1.0));
        self.patterns.insert(name, pattern);
    }

    /// Register or replace a load case.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownLoadPattern`] when the case uses an
    /// unregistered pattern.
    ///
    /// # Examples
    /// ```
    /// use framex::{Frame, LoadCase, LoadPattern};
    ///
    /// let mut frame = Frame::new();
    /// frame.add_load_pattern("DEAD", LoadPattern { self_weight_multiplier: 1.0 });
    /// frame
    ///     .add_load_case("ULS", LoadCase::new().with_pattern("DEAD", 1.4))
    ///     .expect("pattern exists");
    /// assert!(frame
    ///     .add_load_case("SLS", LoadCase::new().with_pattern("WIND", 1.0))
    ///     .is_err());
    /// ```
    pub fn add_load_case(
        &mut self,
        name: impl Into<String>,
        case: LoadCase,
    ) -> Result<(), FrameEditError> {
        self.require_patterns(case.patterns().iter().map(|(pattern, _)| pattern.as_str()))?;
        self.invalidate();
        self.cases.insert(name.into(), case);
        Ok(())
    }

    /// Add a load to a node. Loads of the same pattern accumulate.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownLoadPattern`] or [`FrameEditError::UnknownNode`].
    pub fn add_nodal_load(
        &mut self,
        node: NodeIndex,
        pattern: &str,
        load: Wrench,
    ) -> Result<(), FrameEditError> {
        self.require_patterns([pattern])?;
        self.joint_mut(node)?.loads.push((pattern.to_owned(), load));
        Ok(())
    }

    /// Add a load along an element.
    ///
    /// # Errors
    ///
    /// Returns [`FrameEditError::UnknownLoadPattern`], [`FrameEditError::UnknownElement`],
    /// [`FrameEditError::InvalidRelativePosition`] for a relative position outside `[0, 1]`
    /// or [`FrameEditError::InvalidAbsolutePosition`] for a negative or non-finite distance.
    pub fn add_member_load(
        &mut self,
        element: EdgeIndex,
        pattern: &str,
        load: MemberLoad,
    ) -> Result<(), FrameEditError> {
        self.require_patterns([pattern])?;
        match load {
            MemberLoad::Point {
                position: LoadPosition::Relative(ratio),
                ..
            } if !(0.0..=1.0).contains(&ratio) => {
                return Err(FrameEditError::InvalidRelativePosition(ratio));
            }
            MemberLoad::Point {
                position: LoadPosition::Absolute(distance),
                ..
            } if !distance.is_finite() || distance < 0.0 => {
                return Err(FrameEditError::InvalidAbsolutePosition(distance));
            }
            _ => {}
        }
        self.element_mut(element)?
            .loads
            .push((pattern.to_owned(), load));
        Ok(())
    }

    /// Solve the frame under a load case, reusing cached results when the
    /// model has not changed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] when the case is unknown, the model is
    /// incomplete or the structure cannot be solved.
    pub fn analyze(&mut self, case: &str) -> Result<&AnalysisResults, AnalysisError> {
        if !self.results.contains_key(case) {
            let results = self.solve(case)?;
            self.results.insert(case.to_owned(), results);
        }
        self.results
            .get(case)
            .ok_or_else(|| AnalysisError::UnknownLoadCase(case.to_owned()))
    }

    /// Natural modes of the frame with masses taken from `source`.
    ///
    /// At most one mode per free degree of freedom is returned; a larger
    /// request is clamped.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] when no mode is requested, a mass pattern is
    /// unknown, the model is fully restrained or a free degree of freedom
    /// carries no mass.
    ///
    /// # Examples
    /// ```
    /// use framex::{point, Frame, MassSource, Material, Restraint, Section, SectionProperties};
    ///
    /// let mut frame = Frame::new();
    /// let steel = Material::new(200.0e9, 0.3, 76.9e3).expect("valid steel");
    /// frame.add_material("Steel", steel).expect("new material");
    /// let props = SectionProperties::new(0.01, 1.0e-5, 2.0e-5, 1.0e-5, 0.0, 0.0);
    /// let section = Section::general("Steel", props).expect("valid section");
    /// frame.add_section("S", section).expect("known material");
    /// let base = frame.add_node(point(0.0, 0.0, 0.0));
    /// let tip = frame.add_node(point(3.0, 0.0, 0.0));
    /// frame.set_restraint(base, Restraint::FIXED).expect("known node");
    /// frame.add_element(base, tip, "S").expect("known section");
    ///
    /// let modal = frame.modal(&MassSource::default(), 2).expect("stable frame");
    /// assert_eq!(modal.modes().len(), 2);
    /// assert!(modal.modes()[0].period > modal.modes()[1].period);
    /// ```
    pub fn modal(&self, source: &MassSource, modes: usize) -> Result<ModalResults, AnalysisError> {
        if modes == 0 {
            return Err(AnalysisError::NoModesRequested);
        }
        if let Some((missing, _)) = source
            .load_patterns
            .iter()
            .find(|(name, _)| !self.patterns.contains_key(name))
        {
            return Err(AnalysisError::UnknownLoadPattern(missing.clone()));
        }
        let order: Vec<NodeIndex> = self.graph.node_indices().collect();
        let index_map = Self::node_index_map(&order);
        let dof_count = order.len() * 6;

        let elements = self.prepare_elements()?;
        let stiffness = Self::build_stiffness_matrix(&elements, &index_map, dof_count);
        let mass = self.build_mass_matrix(source, &elements, &index_map, dof_count);
        let free_dofs = self.collect_free_dofs(&index_map);
        if free_dofs.is_empty() {
            return Err(AnalysisError::FullyRestrained);
        }
        info!(
            nodes = order.len(),
            dofs = dof_count,
            equations = free_dofs.len(),
            "assembled stiffness and mass matrices"
        );

        let count = if modes > free_dofs.len() {
            warn!(
                requested = modes,
                available = free_dofs.len(),
                "more modes requested than free degrees of freedom"
            );
            free_dofs.len()
        } else {
            modes
        };
        let k_ff = Self::free_block(&stiffness, &free_dofs);
        let m_ff = Self::free_block(&mass, &free_dofs);
        let pairs = solve_eigenpairs(&k_ff, &m_ff, count)?;
        let results = ModalResults::new(&order, &free_dofs, &mass, &m_ff, pairs);
        info!(
            modes = results.modes().len(),
            first_period = results.modes().first().map_or(0.0, |mode| mode.period),
            "solved eigenvalue problem"
        );
        Ok(results)
    }

    /// Cached results of a load case.
    #[must_use]
    pub fn results(&self, case: &str) -> Option<&AnalysisResults> {
        self.results.get(case)
    }

    /// Reset cached analysis results when the model changes.
    fn invalidate(&mut self) {
        self.results.clear();
    }

    fn joint_mut(&mut self, node: NodeIndex) -> Result<&mut Joint, FrameEditError> {
        if self.graph.node_weight(node).is_none() {
            return Err(FrameEditError::UnknownNode(node));
        }
        self.invalidate();
        self.graph
            .node_weight_mut(node)
            .ok_or(FrameEditError::UnknownNode(node))
    }

    fn element_mut(&mut self, element: EdgeIndex) -> Result<&mut FrameElement, FrameEditError> {
        if self.graph.edge_weight(element).is_none() {
            return Err(FrameEditError::UnknownElement(element));
        }
        self.invalidate();
        self.graph
            .edge_weight_mut(element)
            .ok_or(FrameEditError::UnknownElement(element))
    }

    fn require_patterns<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), FrameEditError> {
        match names
            .into_iter()
            .find(|name| !self.patterns.contains_key(*name))
        {
            Some(missing) => Err(FrameEditError::UnknownLoadPattern(missing.to_owned())),
            None => Ok(()),
        }
    }

    /// Run the full pipeline for one load case.
    fn solve(&self, case_name: &str) -> Result<AnalysisResults, AnalysisError> {
        let case = self
            .cases
            .get(case_name)
            .ok_or_else(|| AnalysisError::UnknownLoadCase(case_name.to_owned()))?;
        let order: Vec<NodeIndex> = self.graph.node_indices().collect();
        let index_map = Self::node_index_map(&order);
        let dof_count = order.len() * 6;
        info!(
            case = case_name,
            nodes = order.len(),
            elements = self.element_count(),
            dofs = dof_count,
            "mapped nodes to degrees of freedom"
        );

        let elements = self.prepare_elements()?;
        let stiffness = Self::build_stiffness_matrix(&elements, &index_map, dof_count);
        let mut load = self.build_load_vector(case, &index_map, dof_count);
        let fixed_end_forces = self.apply_member_loads(case, &elements, &index_map, &mut load)?;
        info!(case = case_name, "assembled global stiffness and load vector");

        let free_dofs = self.collect_free_dofs(&index_map);
        let displacements = Self::solve_displacements(&stiffness, &load, &free_dofs)?;
        Self::check_displacements(&order, &displacements)?;
        let mut reactions = &stiffness * &displacements - &load;
        for &dof in &free_dofs {
            reactions[dof] = 0.0;
        }
        info!(
            case = case_name,
            equations = free_dofs.len(),
            max_displacement = displacements.amax(),
            "solved linear system"
        );

        let nodes = order
            .iter()
            .map(|&node| {
                let joint = &self.graph[node];
                let dofs = index_map[&node] * 6..index_map[&node] * 6 + 6;
                let result = NodeResult {
                    position: joint.position,
                    restraint: joint.restraint,
                    displacement: Displacement::from_dofs(&displacements.as_slice()[dofs.clone()]),
                    reaction: Wrench::from_dofs(&reactions.as_slice()[dofs.clone()]),
                    applied: Wrench::from_dofs(&load.as_slice()[dofs]),
                };
                (node, result)
            })
            .collect();

        let element_results = elements
            .into_iter()
            .zip(fixed_end_forces)
            .map(|(assembled, fixed_end_forces)| {
                let dofs = Self::element_dofs(&index_map, assembled.start, assembled.end);
                let local = Vector12::from_fn(|row, _| displacements[dofs[row]]);
                let element = assembled.element;
                let end_forces = element.end_forces(&local, &fixed_end_forces);
                let result = ElementResult {
                    start: assembled.start,
                    end: assembled.end,
                    rotation: element.rotation,
                    local_stiffness: element.stiffness,
                    transformation: element.transformation,
                    fixed_end_forces,
                    end_forces,
                    total_length: element.total_length,
                    clear_length: element.clear_length,
                };
                (element.id, result)
            })
            .collect();

        Ok(AnalysisResults::new(case_name, dof_count, nodes, element_results))
    }

    /// Construct a mapping from graph indices to contiguous node numbers.
    fn node_index_map(order: &[NodeIndex]) -> HashMap<NodeIndex, usize> {
        order
            .iter()
            .enumerate()
            .map(|(idx, node)| (*node, idx))
            .collect()
    }

    /// Global degrees of freedom of an element's two nodes.
    fn element_dofs(
        index_map: &HashMap<NodeIndex, usize>,
        start: NodeIndex,
        end: NodeIndex,
    ) -> [usize; 12] {
        let start_base = index_map[&start] * 6;
        let end_base = index_map[&end] * 6;
        std::array::from_fn(|i| {
            if i < 6 {
                start_base + i
            } else {
                end_base + i - 6
            }
        })
    }

    /// Resolve sections and materials and build the element matrices.
    fn prepare_elements(&self) -> Result<Vec<Assembled>, AnalysisError> {
        self.graph
            .edge_references()
            .map(|edge| {
                let data = edge.weight();
                let section = self.sections.get(&data.section).ok_or_else(|| {
                    AnalysisError::MissingSection {
                        element: edge.id(),
                        section: data.section.clone(),
                    }
                })?;
                let material = self.materials.get(&section.material).ok_or_else(|| {
                    AnalysisError::MissingMaterial {
                        section: data.section.clone(),
                        material: section.material.clone(),
                    }
                })?;
                section
                    .properties
                    .validate()
                    .and_then(|()| material.validate())
                    .map_err(|source| AnalysisError::InvalidSectionProperties {
                        section: data.section.clone(),
                        source,
                    })?;

                let layout = ElementLayout {
                    start: self.graph[edge.source()].position,
                    end: self.graph[edge.target()].position,
                    joint_offsets: data.joint_offsets,
                    end_offsets: data.end_offsets,
                    beta: data.beta,
                    insertion: section.insertion_offset(data.cardinal),
                    releases: data.releases,
                };
                let element =
                    PreparedElement::new(edge.id(), &layout, *material, section.properties)?;
                Ok(Assembled {
                    start: edge.source(),
                    end: edge.target(),
                    element,
                })
            })
            .collect()
    }

    /// Assemble the global stiffness matrix.
    fn build_stiffness_matrix(
        elements: &[Assembled],
        index_map: &HashMap<NodeIndex, usize>,
        dof_count: usize,
    ) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(dof_count, dof_count);
        for assembled in elements {
            let k = assembled.element.global_stiffness();
            let dofs = Self::element_dofs(index_map, assembled.start, assembled.end);
            for (row_local, global_row) in dofs.iter().enumerate() {
                for (col_local, global_col) in dofs.iter().enumerate() {
                    matrix[(*global_row, *global_col)] += k[(row_local, col_local)];
                }
            }
        }
        matrix
    }

    /// Assemble the nodal part of the load vector.
    fn build_load_vector(
        &self,
        case: &LoadCase,
        index_map: &HashMap<NodeIndex, usize>,
        dof_count: usize,
    ) -> DVector<f64> {
        let mut load = DVector::zeros(dof_count);
        for node in self.graph.node_indices() {
            let base = index_map[&node] * 6;
            for (pattern, wrench) in &self.graph[node].loads {
                let Some(scale) = case.scale_of(pattern) else {
                    continue;
                };
                for (axis, value) in wrench.to_array().iter().enumerate() {
                    load[base + axis] += value * scale;
                }
            }
        }
        load
    }

    /// Add equivalent nodal loads from member loads and self weight.
    ///
    /// Returns the condensed local fixed-end forces of every element in order.
    fn apply_member_loads(
        &self,
        case: &LoadCase,
        elements: &[Assembled],
        index_map: &HashMap<NodeIndex, usize>,
        load: &mut DVector<f64>,
    ) -> Result<Vec<Vector12>, AnalysisError> {
        let self_weight: Vec<(f64, f64)> = self
            .patterns
            .iter()
            .filter(|(_, pattern)| pattern.self_weight_multiplier != 0.0)
            .filter_map(|(name, pattern)| {
                case.scale_of(name)
                    .map(|scale| (pattern.self_weight_multiplier, scale))
            })
            .collect();

        let mut result = Vec::with_capacity(elements.len());
        for assembled in elements {
            let element = &assembled.element;
            let weight = element.properties.area * element.material.unit_weight;
            let generated = self_weight
                .iter()
                .filter(|_| weight > MIN_SELF_WEIGHT)
                .map(|(multiplier, scale)| (MemberLoad::uniform(0.0, 0.0, -weight * multiplier), *scale));
            let assigned = self.graph[element.id]
                .loads
                .iter()
                .filter_map(|(pattern, member_load)| {
                    case.scale_of(pattern).map(|scale| (*member_load, scale))
                });

            let mut raw = Vector12::zeros();
            let mut nodal = Vector12::zeros();
            for (member_load, scale) in assigned.chain(generated) {
                let effect = member_load_effect(element, &member_load, scale);
                raw += effect.fixed_end_forces;
                nodal += rigid_zone_loads(element, &effect.rigid_zone_intensity);
            }
            let fixed_end_forces = element.condense_loads(&raw)?;
            if fixed_end_forces.amax() > 0.0 {
                debug!(
                    element = element.id.index(),
                    fef = ?fixed_end_forces.as_slice(),
                    "computed fixed-end forces"
                );
            }

            let equivalent = nodal - element.transformation.transpose() * fixed_end_forces;
            let dofs = Self::element_dofs(index_map, assembled.start, assembled.end);
            for (local, global) in dofs.iter().enumerate() {
                load[*global] += equivalent[local];
            }
            result.push(fixed_end_forces);
        }
        Ok(result)
    }

    /// Assemble the global mass matrix for a mass source.
    fn build_mass_matrix(
        &self,
        source: &MassSource,
        elements: &[Assembled],
        index_map: &HashMap<NodeIndex, usize>,
        dof_count: usize,
    ) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(dof_count, dof_count);
        let mut add_point_mass = |node: NodeIndex, mass: f64| {
            let base = index_map[&node] * 6;
            for (axis, value) in point_mass(mass).iter().enumerate() {
                matrix[(base + axis, base + axis)] += value;
            }
        };

        for node in self.graph.node_indices() {
            for (pattern, wrench) in &self.graph[node].loads {
                if let Some(scale) = source.scale_of(pattern) {
                    add_point_mass(node, (wrench.fz * scale).abs() / GRAVITY);
                }
            }
        }
        for assembled in elements {
            let element = &assembled.element;
            for (pattern, member_load) in &self.graph[element.id].loads {
                let Some(scale) = source.scale_of(pattern) else {
                    continue;
                };
                let MemberLoad::Distributed {
                    wx,
                    wy,
                    wz,
                    coordinates,
                } = *member_load
                else {
                    continue;
                };
                let vertical = match coordinates {
                    CoordinateSystem::Global => wz,
                    CoordinateSystem::Local => {
                        (element.rotation.transpose() * Vector3::new(wx, wy, wz))[2]
                    }
                };
                let mass = (vertical * scale).abs() * element.total_length / GRAVITY;
                add_point_mass(assembled.start, mass / 2.0);
                add_point_mass(assembled.end, mass / 2.0);
            }
        }

        if source.include_self_mass {
            for assembled in elements {
                let element = &assembled.element;
                let properties = &element.properties;
                let total_mass = properties.area * element.material.unit_weight / GRAVITY
                    * element.total_length;
                if total_mass <= 0.0 {
                    continue;
                }
                let m = global_element_mass(
                    source.distribution,
                    total_mass,
                    element.total_length,
                    (properties.i22 + properties.i33) / properties.area,
                    &element.rotation,
                );
                let dofs = Self::element_dofs(index_map, assembled.start, assembled.end);
                for (row_local, global_row) in dofs.iter().enumerate() {
                    for (col_local, global_col) in dofs.iter().enumerate() {
                        matrix[(*global_row, *global_col)] += m[(row_local, col_local)];
                    }
                }
            }
        }
        matrix
    }

    /// Submatrix on the free degrees of freedom.
    fn free_block(matrix: &DMatrix<f64>, free_dofs: &[usize]) -> DMatrix<f64> {
        DMatrix::from_fn(free_dofs.len(), free_dofs.len(), |row, col| {
            matrix[(free_dofs[row], free_dofs[col])]
        })
    }

    /// Determine the indices corresponding to unrestrained degrees of freedom.
    fn collect_free_dofs(&self, index_map: &HashMap<NodeIndex, usize>) -> Vec<usize> {
        let mut free = Vec::new();
        for node in self.graph.node_indices() {
            let base = index_map[&node] * 6;
            for (axis, fixed) in self.graph[node].restraint.0.iter().enumerate() {
                if !fixed {
                    free.push(base + axis);
                }
            }
        }
        free
    }

    /// Solve for node displacements using the reduced stiffness matrix.
    fn solve_displacements(
        stiffness: &DMatrix<f64>,
        load: &DVector<f64>,
        free_dofs: &[usize],
    ) -> Result<DVector<f64>, AnalysisError> {
        let mut displacements = DVector::zeros(load.len());
        let free_len = free_dofs.len();
        if free_len == 0 {
            info!("structure is fully restrained; no equations to solve");
            return Ok(displacements);
        }
        let k_ff = Self::free_block(stiffness, free_dofs);
        let f_f = DVector::from_fn(free_len, |row, _| load[free_dofs[row]]);
        let pivot_floor = k_ff.amax() * SINGULAR_PIVOT_RATIO;
        let lu = k_ff.lu();
        if lu.u().diagonal().iter().any(|pivot| pivot.abs() <= pivot_floor) {
            return Err(AnalysisError::SingularStiffness);
        }
        let solution = lu.solve(&f_f).ok_or(AnalysisError::SingularStiffness)?;
        for (idx, &dof) in free_dofs.iter().enumerate() {
            displacements[dof] = solution[idx];
        }
        Ok(displacements)
    }

    /// Reject non-finite or implausibly large displacements.
    fn check_displacements(
        order: &[NodeIndex],
        displacements: &DVector<f64>,
    ) -> Result<(), AnalysisError> {
        match displacements
            .iter()
            .position(|value| !value.is_finite() || value.abs() > DISPLACEMENT_LIMIT)
        {
            Some(dof) => Err(AnalysisError::ExcessiveDisplacement {
                node: order[dof / 6],
                magnitude: displacements[dof].abs(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{force, point};
    use crate::loads::LoadDirection;

    const E: f64 = 200.0e9;

    fn frame_with_section(properties: crate::SectionProperties) -> Frame {
        let mut frame = Frame::new();
        frame
            .add_material("Steel", Material::new(E, 0.3, 0.0).expect("valid"))
            .expect("material accepted");
        frame
            .add_section("S", Section::general("Steel", properties).expect("valid"))
            .expect("section accepted");
        frame.add_load_pattern("DEAD", LoadPattern::default());
        frame
    }

    fn euler_properties() -> crate::SectionProperties {
        crate::SectionProperties::new(0.01, 1.0e-5, 2.0e-5, 1.0e-5, 0.0, 0.0)
    }

    fn cantilever(length: f64) -> (Frame, NodeIndex, NodeIndex, EdgeIndex) {
        let mut frame = frame_with_section(euler_properties());
        let base = frame.add_node(point(0.0, 0.0, 0.0));
        let tip = frame.add_node(point(length, 0.0, 0.0));
        frame
            .set_restraint(base, Restraint::FIXED)
            .expect("restraint applied");
        let element = frame.add_element(base, tip, "S").expect("element added");
        (frame, base, tip, element)
    }

    #[test]
    fn node_mutators_return_error_for_unknown_indices() {
        let mut frame = Frame::new();
        let stale = frame.add_node(point(0.0, 0.0, 0.0));
        frame.remove_node(stale).expect("initial removal succeeds");

        assert_eq!(
            frame.move_node(stale, point(1.0, 0.0, 0.0)),
            Err(FrameEditError::UnknownNode(stale))
        );
        assert_eq!(
            frame.set_restraint(stale, Restraint::FIXED),
            Err(FrameEditError::UnknownNode(stale))
        );
        assert_eq!(
            frame.remove_node(stale),
            Err(FrameEditError::UnknownNode(stale))
        );
    }

    #[test]
    fn element_edits_validate_names_and_indices() {
        let (mut frame, base, tip, element) = cantilever(2.0);
        assert_eq!(
            frame.add_element(base, tip, "W14X90"),
            Err(FrameEditError::UnknownSection("W14X90".into()))
        );
        assert_eq!(
            frame.set_end_offsets(element, -0.1, 0.0),
            Err(FrameEditError::InvalidEndOffset(-0.1))
        );
        assert!(matches!(
            frame.set_end_offsets(element, 0.0, f64::NAN),
            Err(FrameEditError::InvalidEndOffset(value)) if value.is_nan()
        ));
        assert_eq!(
            frame.set_end_offsets(element, f64::INFINITY, 0.0),
            Err(FrameEditError::InvalidEndOffset(f64::INFINITY))
        );
        assert_eq!(
            frame.add_nodal_load(tip, "LIVE", force(0.0, 0.0, -1.0)),
            Err(FrameEditError::UnknownLoadPattern("LIVE".into()))
        );
        let load = MemberLoad::point(1.0, LoadPosition::Relative(1.5), LoadDirection::Gravity);
        assert_eq!(
            frame.add_member_load(element, "DEAD", load),
            Err(FrameEditError::InvalidRelativePosition(1.5))
        );
        let load = MemberLoad::point(1.0, LoadPosition::Relative(f64::NAN), LoadDirection::Gravity);
        assert!(frame.add_member_load(element, "DEAD", load).is_err());
        for distance in [-0.5, f64::NAN, f64::INFINITY] {
            let load =
                MemberLoad::point(1.0, LoadPosition::Absolute(distance), LoadDirection::Gravity);
            assert!(matches!(
                frame.add_member_load(element, "DEAD", load),
                Err(FrameEditError::InvalidAbsolutePosition(_))
            ));
        }
        frame.remove_element(element).expect("element removed");
        assert_eq!(
            frame.set_beta_angle(element, 90.0),
            Err(FrameEditError::UnknownElement(element))
        );
    }

    #[test]
    fn load_pattern_creates_matching_case() {
        let frame = frame_with_section(euler_properties());
        let case = frame.load_case("DEAD").expect("case created");
        assert_eq!(case.scale_of("DEAD"), Some(1.0));
    }

    #[test]
    fn cantilever_tip_load_matches_beam_theory() {
        let length = 2.0;
        let (mut frame, base, tip, element) = cantilever(length);
        frame
            .add_nodal_load(tip, "DEAD", force(0.0, 0.0, -1_000.0))
            .expect("load applied");

        let results = frame.analyze("DEAD").expect("analysis succeeds");
        // Deflection along Z bends about local 2, resisted by I22.
        let ei = E * 2.0e-5;
        let displacement = results.displacement(tip).expect("tip result");
        assert_relative_eq!(
            displacement.uz,
            -1_000.0 * length.powi(3) / (3.0 * ei),
            max_relative = 1.0e-9
        );
        assert_relative_eq!(
            displacement.ry,
            1_000.0 * length.powi(2) / (2.0 * ei),
            max_relative = 1.0e-9
        );

        let reaction = results.reaction(base).expect("base result");
        assert_relative_eq!(reaction.fz, 1_000.0, epsilon = 1.0e-6);
        assert_relative_eq!(reaction.my, -2_000.0, epsilon = 1.0e-6);
        assert!(results.equilibrium().balanced);

        let forces = results.element(element).expect("element result");
        assert_relative_eq!(forces.start_forces().fz, 1_000.0, epsilon = 1.0e-6);
    }

    #[test]
    fn fixed_fixed_beam_under_uniform_load_has_textbook_moments() {
        let length = 6.0;
        let w = -5_000.0;
        let mut frame = frame_with_section(euler_properties());
        let a = frame.add_node(point(0.0, 0.0, 0.0));
        let b = frame.add_node(point(length, 0.0, 0.0));
        frame.set_restraint(a, Restraint::FIXED).expect("fixed");
        frame.set_restraint(b, Restraint::FIXED).expect("fixed");
        let beam = frame.add_element(a, b, "S").expect("added");
        frame
            .add_member_load(beam, "DEAD", MemberLoad::uniform(0.0, 0.0, w))
            .expect("load applied");

        let results = frame.analyze("DEAD").expect("solved");
        let reaction = results.reaction(a).expect("reaction");
        assert_relative_eq!(reaction.fz, -w * length / 2.0, max_relative = 1.0e-9);
        assert_relative_eq!(reaction.my.abs(), w.abs() * length * length / 12.0, max_relative = 1.0e-9);
        assert!(results.equilibrium().balanced);
        assert_eq!(results.max_displacement(), 0.0);
    }

    #[test]
    fn simply_supported_point_load_midspan_deflection() {
        let length = 4.0;
        let p = 10_000.0;
        let mut frame = frame_with_section(euler_properties());
        let a = frame.add_node(point(0.0, 0.0, 0.0));
        let b = frame.add_node(point(length, 0.0, 0.0));
        frame
            .set_restraint(a, Restraint([true, true, true, true, false, false]))
            .expect("pin with torsion restraint");
        frame
            .set_restraint(b, Restraint([false, true, true, false, false, false]))
            .expect("roller");
        let beam = frame.add_element(a, b, "S").expect("added");
        frame
            .add_member_load(
                beam,
                "DEAD",
                MemberLoad::point(p, LoadPosition::Relative(0.5), LoadDirection::Gravity),
            )
            .expect("load applied");

        let results = frame.analyze("DEAD").expect("solved");
        let ei = E * 2.0e-5;
        // End rotation of a simply supported beam under midspan load is P L² / (16 EI).
        let rotation = results.displacement(a).expect("result").ry;
        assert_relative_eq!(rotation.abs(), p * length * length / (16.0 * ei), max_relative = 1.0e-9);

        // The drawn curve interpolates the end rotations only.
        let shape = results.deflected_shape(beam, 1.0, 3).expect("shape");
        assert_relative_eq!(
            shape[1].position.z,
            -length * rotation.abs() / 4.0,
            max_relative = 1.0e-9
        );
    }

    #[test]
    fn moment_release_turns_propped_cantilever_into_simple_span() {
        let length = 5.0;
        let w = -2_000.0;
        let mut frame = frame_with_section(euler_properties());
        let a = frame.add_node(point(0.0, 0.0, 0.0));
        let b = frame.add_node(point(length, 0.0, 0.0));
        frame.set_restraint(a, Restraint::FIXED).expect("fixed");
        frame.set_restraint(b, Restraint::FIXED).expect("fixed");
        let beam = frame.add_element(a, b, "S").expect("added");
        let mut releases = EndReleases::none();
        releases.end[4] = true;
        frame.set_releases(beam, releases).expect("released");
        frame
            .add_member_load(beam, "DEAD", MemberLoad::uniform(0.0, 0.0, w))
            .expect("load applied");

        let results = frame.analyze("DEAD").expect("solved");
        let start = results.reaction(a).expect("start");
        let end = results.reaction(b).expect("end");
        assert_relative_eq!(start.fz, -5.0 * w * length / 8.0, max_relative = 1.0e-6);
        assert_relative_eq!(end.fz, -3.0 * w * length / 8.0, max_relative = 1.0e-6);
        assert!(end.my.abs() < 1.0e-3);
    }

    #[test]
    fn uniform_load_over_rigid_zones_reaches_the_supports() {
        let length = 6.0;
        let rigid = 1.0;
        let w = -5_000.0;
        let mut frame = frame_with_section(euler_properties());
        let a = frame.add_node(point(0.0, 0.0, 0.0));
        let b = frame.add_node(point(length, 0.0, 0.0));
        frame
            .set_restraint(a, Restraint([true, true, true, true, false, false]))
            .expect("pin with torsion restraint");
        frame
            .set_restraint(b, Restraint([false, true, true, false, false, false]))
            .expect("roller");
        let beam = frame.add_element(a, b, "S").expect("added");
        frame
            .set_end_offsets(beam, rigid, rigid)
            .expect("rigid zones set");
        frame
            .add_member_load(beam, "DEAD", MemberLoad::uniform(0.0, 0.0, w))
            .expect("load applied");

        let results = frame.analyze("DEAD").expect("solved");
        // The zones carry their share of the load straight to the nodes.
        for node in [a, b] {
            let reaction = results.reaction(node).expect("support");
            assert_relative_eq!(reaction.fz, -w * length / 2.0, max_relative = 1.0e-9);
            assert!(reaction.my.abs() < 1.0e-6);
        }
        assert!(results.equilibrium().balanced);

        // The clear span sees the load plus end moments from the cantilevered zones.
        let clear = length - 2.0 * rigid;
        let zone_moment = -w * length / 2.0 * rigid + w * rigid * rigid / 2.0;
        let ei = E * 2.0e-5;
        let rotation = results.displacement(a).expect("result").ry;
        assert_relative_eq!(
            rotation.abs(),
            (w.abs() * clear.powi(3) / 24.0 + zone_moment * clear / 2.0) / ei,
            max_relative = 1.0e-9
        );

        let forces = results.element(beam).expect("element result");
        assert_relative_eq!(forces.start_forces().fz, -w * clear / 2.0, max_relative = 1.0e-9);
        assert_relative_eq!(forces.start_forces().my.abs(), zone_moment, max_relative = 1.0e-9);
    }

    #[test]
    fn top_insertion_point_bends_an_axially_loaded_member() {
        let length = 3.0;
        let p = 100_000.0;
        let mut frame = frame_with_section(euler_properties());
        frame
            .add_section("R", Section::rectangular("Steel", 0.3, 0.6).expect("valid"))
            .expect("section accepted");
        let a = frame.add_node(point(0.0, 0.0, 0.0));
        let b = frame.add_node(point(length, 0.0, 0.0));
        frame.set_restraint(a, Restraint::FIXED).expect("fixed");
        let member = frame.add_element(a, b, "R").expect("added");
        frame
            .set_cardinal_point(member, CardinalPoint::TopCenter)
            .expect("insertion point set");
        frame
            .add_nodal_load(b, "DEAD", force(p, 0.0, 0.0))
            .expect("load applied");

        let i22 = frame.section("R").expect("registered").properties.i22;
        let results = frame.analyze("DEAD").expect("solved");

        // The centroid hangs half the depth below the node line.
        let eccentricity = 0.3;
        let forces = results.element(member).expect("element result");
        assert_relative_eq!(forces.start_forces().fx.abs(), p, max_relative = 1.0e-9);
        assert_relative_eq!(forces.start_forces().my.abs(), p * eccentricity, max_relative = 1.0e-9);
        assert_relative_eq!(forces.end_forces().my.abs(), p * eccentricity, max_relative = 1.0e-9);

        let tip = results.displacement(b).expect("tip result");
        assert_relative_eq!(
            tip.ry.abs(),
            p * eccentricity * length / (E * i22),
            max_relative = 1.0e-8
        );

        // The load acts through the support, so the node sees no moment.
        let reaction = results.reaction(a).expect("support");
        assert_relative_eq!(reaction.fx, -p, max_relative = 1.0e-9);
        assert!(reaction.my.abs() < 1.0e-3);
        assert!(results.equilibrium().balanced);
    }

    #[test]
    fn self_weight_is_generated_for_weighted_patterns() {
        let mut frame = Frame::new();
        frame
            .add_material("Concrete", Material::new(30.0e9, 0.2, 25_000.0).expect("valid"))
            .expect("material");
        frame
            .add_section("B", Section::rectangular("Concrete", 0.3, 0.5).expect("valid"))
            .expect("section");
        frame.add_load_pattern("DEAD", LoadPattern { self_weight_multiplier: 1.0 });
        frame
            .add_load_case("ULS", LoadCase::new().with_pattern("DEAD", 1.4))
            .expect("case");
        let a = frame.add_node(point(0.0, 0.0, 0.0));
        let b = frame.add_node(point(4.0, 0.0, 0.0));
        frame.set_restraint(a, Restraint::FIXED).expect("fixed");
        frame.set_restraint(b, Restraint::FIXED).expect("fixed");
        frame.add_element(a, b, "B").expect("added");

        let total = 0.15 * 25_000.0 * 4.0 * 1.4;
        let base = frame.analyze("ULS").expect("solved").base_reaction();
        assert_relative_eq!(base.fz, total, max_relative = 1.0e-9);
    }

    /// Cantilever of [`euler_properties`] in steel with a real unit weight.
    fn weighted_cantilever(length: f64) -> (Frame, NodeIndex, NodeIndex) {
        let mut frame = Frame::new();
        frame
            .add_material("Steel", Material::new(E, 0.3, 76.9e3).expect("valid"))
            .expect("material accepted");
        frame
            .add_section("S", Section::general("Steel", euler_properties()).expect("valid"))
            .expect("section accepted");
        let base = frame.add_node(point(0.0, 0.0, 0.0));
        let tip = frame.add_node(point(length, 0.0, 0.0));
        frame
            .set_restraint(base, Restraint::FIXED)
            .expect("restraint applied");
        frame.add_element(base, tip, "S").expect("element added");
        (frame, base, tip)
    }

    #[test]
    fn cantilever_first_mode_matches_two_degree_of_freedom_solution() {
        let length = 3.0;
        let (frame, base, tip) = weighted_cantilever(length);
        let modal = frame
            .modal(&MassSource::default(), 3)
            .expect("modal analysis succeeds");

        // Tip mass m with rotary inertia r m on the Euler tip stiffness in the 1-2 plane.
        let m = 0.01 * 76.9e3 / GRAVITY * length / 2.0;
        let r = crate::mass::ROTARY_MASS_RATIO;
        let a = E * 1.0e-5 / length.powi(3);
        let quad = r * m * m;
        let lin = a * m * (12.0 * r + 4.0 * length * length);
        let constant = 12.0 * a * a * length * length;
        let lambda = 2.0 * constant / (lin + (lin * lin - 4.0 * quad * constant).sqrt());

        let first = modal.mode(1).expect("first mode");
        assert_relative_eq!(first.eigenvalue, lambda, max_relative = 1.0e-8);
        assert_relative_eq!(
            first.period,
            std::f64::consts::TAU / lambda.sqrt(),
            max_relative = 1.0e-8
        );
        assert!(first.participation.uy > 0.999);
        assert!(first.participation.ux < 1.0e-9);
        assert!(first.participation.uz < 1.0e-9);
        assert!(first.shape[&tip].uy > 0.0);
        assert_eq!(first.shape[&base], Displacement::default());

        let second = modal.mode(2).expect("second mode");
        assert!(second.period < first.period);
        assert!(second.participation.uz > 0.999);
        assert_eq!(modal.free_dof_count(), 6);
        assert_eq!(modal.dof_count(), 12);
    }

    #[test]
    fn all_modes_activate_the_whole_mass() {
        let (frame, _, tip) = weighted_cantilever(4.0);
        let modal = frame
            .modal(&MassSource::default(), 20)
            .expect("modal analysis succeeds");

        assert_eq!(modal.modes().len(), 6);
        let last = modal.mode(6).expect("last mode").participation;
        assert_relative_eq!(last.sum_ux, 1.0, max_relative = 1.0e-9);
        assert_relative_eq!(last.sum_uy, 1.0, max_relative = 1.0e-9);
        assert_relative_eq!(last.sum_uz, 1.0, max_relative = 1.0e-9);
        let tip_mass = 0.01 * 76.9e3 / GRAVITY * 2.0;
        for total in modal.total_mass() {
            assert_relative_eq!(total, tip_mass, max_relative = 1.0e-12);
        }
        assert!(modal
            .modes()
            .windows(2)
            .all(|pair| pair[0].eigenvalue <= pair[1].eigenvalue));
        let mass = modal.assembled_mass(tip).expect("tip is assembled");
        assert_relative_eq!(mass[0], tip_mass, max_relative = 1.0e-12);
    }

    #[test]
    fn consistent_mass_approaches_the_continuous_cantilever() {
        let (frame, _, _) = weighted_cantilever(3.0);
        let lumped = frame
            .modal(&MassSource::default(), 1)
            .expect("lumped modal");
        let consistent = frame
            .modal(
                &MassSource::default().with_distribution(crate::MassDistribution::Consistent),
                1,
            )
            .expect("consistent modal");

        // Continuous cantilever: ω = 1.875² sqrt(EI / m̄L⁴).
        let mass_per_length = 0.01 * 76.9e3 / GRAVITY;
        let exact =
            1.875_104_f64.powi(2) * (E * 1.0e-5 / (mass_per_length * 3.0_f64.powi(4))).sqrt();
        let consistent_omega = consistent.modes()[0].angular_frequency;
        assert_relative_eq!(consistent_omega, exact, max_relative = 0.01);
        assert!(lumped.modes()[0].angular_frequency < 0.75 * exact);
    }

    #[test]
    fn load_patterns_contribute_mass() {
        let (mut frame, _, tip, _) = cantilever(2.0);
        frame.add_load_pattern("SDL", LoadPattern::default());
        frame
            .add_nodal_load(tip, "SDL", force(0.0, 0.0, -GRAVITY * 1_000.0))
            .expect("load added");

        let source = MassSource::loads_only().with_pattern("SDL", 1.0);
        let modal = frame.modal(&source, 2).expect("modal analysis succeeds");
        let mass = modal.assembled_mass(tip).expect("tip is assembled");
        for (actual, expected) in mass.iter().zip([1_000.0, 1_000.0, 1_000.0, 0.1, 0.1, 0.1]) {
            assert_relative_eq!(*actual, expected, max_relative = 1.0e-12);
        }
        assert_relative_eq!(modal.total_mass()[2], 1_000.0, max_relative = 1.0e-12);
    }

    #[test]
    fn distributed_loads_are_shared_between_both_ends() {
        let mut frame = frame_with_section(euler_properties());
        let left = frame.add_node(point(0.0, 0.0, 0.0));
        let right = frame.add_node(point(4.0, 0.0, 0.0));
        let element = frame.add_element(left, right, "S").expect("element added");
        frame
            .add_member_load(element, "DEAD", MemberLoad::uniform(0.0, 0.0, -GRAVITY * 500.0))
            .expect("load added");

        let source = MassSource::loads_only().with_pattern("DEAD", 2.0);
        let modal = frame.modal(&source, 1).expect("free frame still has mass");
        for node in [left, right] {
            let mass = modal.assembled_mass(node).expect("node is assembled");
            assert_relative_eq!(mass[2], 2_000.0, max_relative = 1.0e-12);
        }
        assert_relative_eq!(modal.total_mass()[2], 4_000.0, max_relative = 1.0e-12);
        // Unsupported, so six rigid-body modes come first.
        let first = modal.mode(1).expect("first mode");
        assert_eq!(first.angular_frequency, 0.0);
        assert!(first.period.is_infinite());
    }

    #[test]
    fn modal_errors_are_typed() {
        let (mut frame, base, tip, _) = cantilever(2.0);
        assert_eq!(
            frame.modal(&MassSource::default(), 0).map(|_| ()),
            Err(AnalysisError::NoModesRequested)
        );
        assert_eq!(
            frame
                .modal(&MassSource::default().with_pattern("LIVE", 1.0), 1)
                .map(|_| ()),
            Err(AnalysisError::UnknownLoadPattern("LIVE".into()))
        );
        // Zero unit weight and no load mass leaves the free joint massless.
        assert_eq!(
            frame.modal(&MassSource::default(), 1).map(|_| ()),
            Err(AnalysisError::InvalidMassMatrix)
        );

        for node in [base, tip] {
            frame
                .set_restraint(node, Restraint::FIXED)
                .expect("restraint applied");
        }
        assert_eq!(
            frame.modal(&MassSource::default(), 1).map(|_| ()),
            Err(AnalysisError::FullyRestrained)
        );
    }

    #[test]
    fn unsupported_frame_is_singular() {
        let (mut frame, base, tip, _) = cantilever(3.0);
        frame
            .set_restraint(base, Restraint::FREE)
            .expect("restraint removed");
        frame
            .add_nodal_load(tip, "DEAD", force(0.0, 0.0, -10.0))
            .expect("load applied");
        let error = frame.analyze("DEAD").expect_err("mechanism detected");
        assert!(matches!(
            error,
            AnalysisError::SingularStiffness | AnalysisError::ExcessiveDisplacement { .. }
        ));
    }

    #[test]
    fn analysis_errors_are_typed() {
        let (mut frame, _, _, element) = cantilever(3.0);
        assert_eq!(
            frame.analyze("LIVE").map(|_| ()),
            Err(AnalysisError::UnknownLoadCase("LIVE".into()))
        );
        frame.set_end_offsets(element, 1.5, 1.5).expect("offsets set");
        assert_eq!(
            frame.analyze("DEAD").map(|_| ()),
            Err(AnalysisError::NonPositiveClearLength {
                element,
                clear_length: 0.0
            })
        );

        let (mut frame, base, _, element) = cantilever(3.0);
        frame
            .move_node(base, point(3.0, 0.0, 0.0))
            .expect("node moved");
        assert_eq!(
            frame.analyze("DEAD").map(|_| ()),
            Err(AnalysisError::ZeroLengthElement(element))
        );
    }

    #[test]
    fn fully_restrained_model_returns_negated_loads() {
        let (mut frame, _, tip, _) = cantilever(2.0);
        frame.set_restraint(tip, Restraint::FIXED).expect("fixed");
        frame
            .add_nodal_load(tip, "DEAD", force(0.0, 500.0, 0.0))
            .expect("load");
        let results = frame.analyze("DEAD").expect("solved");
        assert_eq!(results.reaction(tip).expect("tip").fy, -500.0);
        assert_eq!(results.max_displacement(), 0.0);
    }

    #[test]
    fn edits_invalidate_cached_results() {
        let (mut frame, _, tip, _) = cantilever(2.0);
        frame.analyze("DEAD").expect("solved");
        assert!(frame.results("DEAD").is_some());
        frame
            .add_nodal_load(tip, "DEAD", force(1.0, 0.0, 0.0))
            .expect("load");
        assert!(frame.results("DEAD").is_none());
    }
}
