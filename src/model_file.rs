//! JSON model, results and matrices documents.
//!
//! A model document lists materials, sections, nodes, elements, load patterns,
//! load cases and loads. Nodes and elements carry user ids which are kept in a
//! [`LoadedModel`] so results can be written back keyed by the same ids.
//!
//! ```json
//! {
//!   "materials": [{ "name": "Steel", "E": 2.0e11, "nu": 0.3, "rho": 76900.0 }],
//!   "sections": [{ "name": "R", "mat_name": "Steel", "type": "rectangular", "b": 0.2, "h": 0.4 }],
//!   "nodes": [
//!     { "id": 1, "x": 0.0, "y": 0.0, "z": 0.0, "restraints": [true, true, true, true, true, true] },
//!     { "id": 2, "x": 3.0, "y": 0.0, "z": 0.0 }
//!   ],
//!   "elements": [{ "id": 1, "n1_id": 1, "n2_id": 2, "sec_name": "R" }],
//!   "load_patterns": [{ "name": "DEAD", "sw_mult": 1.0 }],
//!   "load_cases": [{ "name": "DEAD", "loads": [["DEAD", 1.0]] }],
//!   "loads": [{ "type": "nodal", "pattern": "DEAD", "node_id": 2, "fz": -1000.0 }],
//!   "mass_sources": [{ "name": "MSSSRC1", "include_patterns": true, "load_patterns": [["DEAD", 1.0]] }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::element::{EndReleases, Matrix12};
use crate::errors::{AnalysisError, ModelFileError};
use crate::frame::{Frame, Restraint};
use crate::geometry::{Point, Wrench};
use crate::loads::{CoordinateSystem, LoadCase, LoadDirection, LoadPattern, LoadPosition, MemberLoad};
use crate::mass::{MassDistribution, MassSource};
use crate::modal::ModalResults;
use crate::results::AnalysisResults;
use crate::section::{CardinalPoint, IDimensions, Material, Section, SectionProperties};

/// Material entry of a model document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    /// Material name.
    pub name: String,
    /// Young's modulus in pascals.
    #[serde(rename = "E")]
    pub elastic_modulus: f64,
    /// Shear modulus in pascals, used when `nu` is absent.
    #[serde(rename = "G", default)]
    pub shear_modulus: Option<f64>,
    /// Poisson's ratio.
    #[serde(rename = "nu", default)]
    pub poisson_ratio: Option<f64>,
    /// Unit weight in newtons per cubic metre.
    #[serde(rename = "rho", default)]
    pub unit_weight: f64,
    /// Yield strength in pascals.
    #[serde(rename = "fy", default)]
    pub yield_strength: Option<f64>,
}

impl MaterialRecord {
    fn to_material(&self) -> Result<Material, ModelFileError> {
        let poisson_ratio = match (self.poisson_ratio, self.shear_modulus) {
            (Some(nu), _) => nu,
            (None, Some(g)) if g > 0.0 => self.elastic_modulus / (2.0 * g) - 1.0,
            _ => return Err(ModelFileError::IncompleteMaterial(self.name.clone())),
        };
        let material = Material::new(self.elastic_modulus, poisson_ratio, self.unit_weight)
            .map_err(|source| ModelFileError::Edit(source.into()))?;
        Ok(match self.yield_strength {
            Some(fy) => material.with_yield_strength(fy),
            None => material,
        })
    }
}

/// Shape of a section entry, tagged by `"type"`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeRecord {
    /// Solid rectangle of width `b` and depth `h`.
    Rectangular {
        /// Width along local 2.
        b: f64,
        /// Depth along local 3.
        h: f64,
    },
    /// Plate I-shape.
    ISection {
        /// Overall depth.
        h: f64,
        /// Top flange width.
        w_top: f64,
        /// Top flange thickness.
        t_top: f64,
        /// Bottom flange width.
        w_bot: f64,
        /// Bottom flange thickness.
        t_bot: f64,
        /// Web thickness.
        t_web: f64,
    },
    /// Properties only.
    General,
}

/// Section entry of a model document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    /// Section name.
    pub name: String,
    /// Material name.
    pub mat_name: String,
    /// Shape and dimensions.
    #[serde(flatten)]
    pub shape: ShapeRecord,
    /// Tabulated properties. Required for general sections, optional for
    /// I-sections and ignored for rectangles.
    #[serde(default)]
    pub properties: Option<SectionProperties>,
}

impl SectionRecord {
    fn to_section(&self) -> Result<Section, ModelFileError> {
        let material = self.mat_name.as_str();
        let section = match (self.shape, self.properties) {
            (ShapeRecord::Rectangular { b, h }, _) => Section::rectangular(material, b, h),
            (
                ShapeRecord::ISection {
                    h,
                    w_top,
                    t_top,
                    w_bot,
                    t_bot,
                    t_web,
                },
                properties,
            ) => {
                let dimensions = IDimensions {
                    depth: h,
                    top_flange_width: w_top,
                    top_flange_thickness: t_top,
                    bottom_flange_width: w_bot,
                    bottom_flange_thickness: t_bot,
                    web_thickness: t_web,
                };
                match properties {
                    Some(properties) => {
                        Section::i_shape_tabulated(material, dimensions, properties)
                    }
                    None => Section::i_shape(material, dimensions),
                }
            }
            (ShapeRecord::General, properties) => {
                Section::general(material, properties.unwrap_or_default())
            }
        };
        section.map_err(|source| ModelFileError::Edit(source.into()))
    }
}

/// Node entry of a model document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// User id.
    pub id: u32,
    /// Global X in metres.
    pub x: f64,
    /// Global Y in metres.
    pub y: f64,
    /// Global Z in metres.
    pub z: f64,
    /// Restrained degrees of freedom.
    #[serde(default)]
    pub restraints: Restraint,
}

/// Element entry of a model document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// User id.
    pub id: u32,
    /// Start node id.
    pub n1_id: u32,
    /// End node id.
    pub n2_id: u32,
    /// Section name.
    pub sec_name: String,
    /// Local axis rotation in degrees.
    #[serde(default)]
    pub beta: f64,
    /// Released degrees of freedom at the start.
    #[serde(default)]
    pub rel_i: [bool; 6],
    /// Released degrees of freedom at the end.
    #[serde(default)]
    pub rel_j: [bool; 6],
    /// Global offset from the start node.
    #[serde(default)]
    pub off_i: [f64; 3],
    /// Global offset from the end node.
    #[serde(default)]
    pub off_j: [f64; 3],
    /// Rigid zone length at the start.
    #[serde(default)]
    pub end_off_i: f64,
    /// Rigid zone length at the end.
    #[serde(default)]
    pub end_off_j: f64,
    /// Insertion point, 1 to 11.
    #[serde(default)]
    pub cardinal: CardinalPoint,
}

/// Load pattern entry of a model document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Pattern name.
    pub name: String,
    /// Self weight multiplier.
    #[serde(default)]
    pub sw_mult: f64,
}

/// Load case entry of a model document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Case name.
    pub name: String,
    /// Pattern names with scale factors.
    #[serde(default)]
    pub loads: Vec<(String, f64)>,
}

/// Mass source entry of a model document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MassSourceRecord {
    /// Source name.
    pub name: String,
    /// Include element self mass.
    #[serde(default = "include_by_default")]
    pub include_self_mass: bool,
    /// Convert the vertical loads of `load_patterns` to mass.
    #[serde(default)]
    pub include_patterns: bool,
    /// Pattern names with scale factors.
    #[serde(default)]
    pub load_patterns: Vec<(String, f64)>,
    /// Distribution of element self mass.
    #[serde(default)]
    pub distribution: MassDistribution,
}

fn include_by_default() -> bool {
    true
}

impl MassSourceRecord {
    fn to_mass_source(&self) -> MassSource {
        let source = MassSource {
            include_self_mass: self.include_self_mass,
            load_patterns: Vec::new(),
            distribution: self.distribution,
        };
        if self.include_patterns {
            self.load_patterns
                .iter()
                .fold(source, |source, (pattern, scale)| {
                    source.with_pattern(pattern.as_str(), *scale)
                })
        } else {
            source
        }
    }
}

/// Load entry of a model document, tagged by `"type"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadRecord {
    /// Force and moment at a node.
    Nodal {
        /// Pattern name.
        pattern: String,
        /// Loaded node id.
        node_id: u32,
        #[allow(missing_docs)]
        #[serde(default)]
        fx: f64,
        #[allow(missing_docs)]
        #[serde(default)]
        fy: f64,
        #[allow(missing_docs)]
        #[serde(default)]
        fz: f64,
        #[allow(missing_docs)]
        #[serde(default)]
        mx: f64,
        #[allow(missing_docs)]
        #[serde(default)]
        my: f64,
        #[allow(missing_docs)]
        #[serde(default)]
        mz: f64,
    },
    /// Uniform load over an element.
    MemberDist {
        /// Pattern name.
        pattern: String,
        /// Loaded element id.
        element_id: u32,
        #[allow(missing_docs)]
        #[serde(default)]
        wx: f64,
        #[allow(missing_docs)]
        #[serde(default)]
        wy: f64,
        #[allow(missing_docs)]
        #[serde(default)]
        wz: f64,
        /// Axes of the intensities.
        #[serde(default)]
        coord: CoordinateSystem,
    },
    /// Concentrated force on an element.
    MemberPoint {
        /// Pattern name.
        pattern: String,
        /// Loaded element id.
        element_id: u32,
        /// Signed magnitude in newtons.
        force: f64,
        /// Distance from the start node, or a fraction when `is_rel` is set.
        dist: f64,
        /// Whether `dist` is relative to the element length.
        #[serde(default)]
        is_rel: bool,
        /// Direction such as `"Gravity"`, `"X"` or `"Local 2"`.
        dir: String,
        /// Axes of the direction.
        #[serde(default)]
        coord: CoordinateSystem,
    },
}

/// Parse a free-form direction label.
fn parse_direction(label: &str) -> Option<LoadDirection> {
    let label = label.to_uppercase();
    if label.contains("GRAVITY") {
        Some(LoadDirection::Gravity)
    } else if label.contains('X') || label.contains('1') {
        Some(LoadDirection::X)
    } else if label.contains('Y') || label.contains('2') {
        Some(LoadDirection::Y)
    } else if label.contains('Z') || label.contains('3') {
        Some(LoadDirection::Z)
    } else {
        None
    }
}

/// Complete model document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDocument {
    /// Materials.
    pub materials: Vec<MaterialRecord>,
    /// Sections.
    pub sections: Vec<SectionRecord>,
    /// Nodes.
    pub nodes: Vec<NodeRecord>,
    /// Elements.
    pub elements: Vec<ElementRecord>,
    /// Load patterns.
    pub load_patterns: Vec<PatternRecord>,
    /// Load cases.
    pub load_cases: Vec<CaseRecord>,
    /// Loads.
    pub loads: Vec<LoadRecord>,
    /// Mass sources for modal analysis.
    pub mass_sources: Vec<MassSourceRecord>,
}

impl ModelDocument {
    /// Read a model document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ModelFileError::Read`] when the file cannot be read and
    /// [`ModelFileError::Parse`] when it is not a valid document.
    pub fn read(path: &Path) -> Result<Self, ModelFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ModelFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build a [`Frame`] from the document.
    ///
    /// Nodes are inserted in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`ModelFileError`] for duplicate or dangling ids and for any
    /// definition the frame rejects.
    pub fn build(&self) -> Result<LoadedModel, ModelFileError> {
        let mut model = LoadedModel::default();
        let frame = &mut model.frame;

        for record in &self.materials {
            frame.add_material(record.name.as_str(), record.to_material()?)?;
        }
        for record in &self.sections {
            frame.add_section(record.name.as_str(), record.to_section()?)?;
        }

        let mut nodes: Vec<&NodeRecord> = self.nodes.iter().collect();
        nodes.sort_by_key(|record| record.id);
        for record in nodes {
            if model.node_ids.contains_key(&record.id) {
                return Err(ModelFileError::DuplicateId(record.id));
            }
            let node = frame.add_node(Point::new(record.x, record.y, record.z));
            frame.set_restraint(node, record.restraints)?;
            model.node_ids.insert(record.id, node);
            model.node_labels.insert(node, record.id);
        }

        for record in &self.elements {
            if model.element_ids.contains_key(&record.id) {
                return Err(ModelFileError::DuplicateId(record.id));
            }
            let start = lookup(&model.node_ids, record.n1_id, ModelFileError::UnknownNodeId)?;
            let end = lookup(&model.node_ids, record.n2_id, ModelFileError::UnknownNodeId)?;
            let element = frame.add_element(start, end, &record.sec_name)?;
            frame.set_beta_angle(element, record.beta)?;
            frame.set_releases(
                element,
                EndReleases {
                    start: record.rel_i,
                    end: record.rel_j,
                },
            )?;
            let [xi, yi, zi] = record.off_i;
            let [xj, yj, zj] = record.off_j;
            frame.set_joint_offsets(element, Point::new(xi, yi, zi), Point::new(xj, yj, zj))?;
            frame.set_end_offsets(element, record.end_off_i, record.end_off_j)?;
            frame.set_cardinal_point(element, record.cardinal)?;
            model.element_ids.insert(record.id, element);
            model.element_labels.insert(element, record.id);
        }

        for record in &self.load_patterns {
            frame.add_load_pattern(
                record.name.as_str(),
                LoadPattern {
                    self_weight_multiplier: record.sw_mult,
                },
            );
        }
        for record in &self.load_cases {
            let case = record
                .loads
                .iter()
                .fold(LoadCase::new(), |case, (pattern, scale)| {
                    case.with_pattern(pattern.as_str(), *scale)
                });
            frame.add_load_case(record.name.as_str(), case)?;
        }

        for record in &self.loads {
            model.apply_load(record)?;
        }
        model.mass_sources = self
            .mass_sources
            .iter()
            .map(|record| (record.name.clone(), record.to_mass_source()))
            .collect();

        info!(
            nodes = model.frame.node_count(),
            elements = model.frame.element_count(),
            loads = self.loads.len(),
            "model document loaded"
        );
        Ok(model)
    }
}

fn lookup<K: Ord + Copy, V: Copy>(
    map: &BTreeMap<K, V>,
    key: K,
    missing: impl FnOnce(K) -> ModelFileError,
) -> Result<V, ModelFileError> {
    map.get(&key).copied().ok_or_else(|| missing(key))
}

/// Read and build a model document in one step.
///
/// # Errors
///
/// See [`ModelDocument::read`] and [`ModelDocument::build`].
pub fn load_model(path: &Path) -> Result<LoadedModel, ModelFileError> {
    ModelDocument::read(path)?.build()
}

/// Frame built from a document together with its user id maps.
#[derive(Debug, Default)]
pub struct LoadedModel {
    frame: Frame,
    node_ids: BTreeMap<u32, NodeIndex>,
    element_ids: BTreeMap<u32, EdgeIndex>,
    node_labels: HashMap<NodeIndex, u32>,
    element_labels: HashMap<EdgeIndex, u32>,
    mass_sources: Vec<(String, MassSource)>,
}

impl LoadedModel {
    /// The built frame.
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Mutable access to the frame, for analysis or further edits.
    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    /// Graph index of a user node id.
    #[must_use]
    pub fn node(&self, id: u32) -> Option<NodeIndex> {
        self.node_ids.get(&id).copied()
    }

    /// Graph index of a user element id.
    #[must_use]
    pub fn element(&self, id: u32) -> Option<EdgeIndex> {
        self.element_ids.get(&id).copied()
    }

    /// User ids keyed by graph index, for labelling reports.
    #[must_use]
    pub fn node_labels(&self) -> &HashMap<NodeIndex, u32> {
        &self.node_labels
    }

    /// Solve a load case.
    ///
    /// # Errors
    ///
    /// Returns the [`AnalysisError`] raised by the frame.
    pub fn analyze(&mut self, case: &str) -> Result<&AnalysisResults, AnalysisError> {
        self.frame.analyze(case)
    }

    /// Mass source by name.
    ///
    /// `"Default"` falls back to the first source of the document, or to self
    /// mass only when the document defines none.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownMassSource`] for any other unknown name.
    pub fn mass_source(&self, name: &str) -> Result<MassSource, AnalysisError> {
        if let Some((_, source)) = self.mass_sources.iter().find(|(key, _)| key == name) {
            return Ok(source.clone());
        }
        if name == "Default" {
            return Ok(self
                .mass_sources
                .first()
                .map(|(_, source)| source.clone())
                .unwrap_or_default());
        }
        Err(AnalysisError::UnknownMassSource(name.to_owned()))
    }

    /// Solve the lowest `modes` natural modes with a named mass source.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] for an unknown mass source or a failed solve.
    pub fn modal(&self, mass_source: &str, modes: usize) -> Result<ModalResults, AnalysisError> {
        let source = self.mass_source(mass_source)?;
        debug!(mass_source, ?source, "resolved mass source");
        self.frame.modal(&source, modes)
    }

    fn node_label(&self, node: NodeIndex) -> u32 {
        self.node_labels
            .get(&node)
            .copied()
            .unwrap_or(node.index() as u32)
    }

    fn apply_load(&mut self, record: &LoadRecord) -> Result<(), ModelFileError> {
        match record {
            LoadRecord::Nodal {
                pattern,
                node_id,
                fx,
                fy,
                fz,
                mx,
                my,
                mz,
            } => {
                let node = lookup(&self.node_ids, *node_id, ModelFileError::UnknownNodeId)?;
                self.frame
                    .add_nodal_load(node, pattern, Wrench::new(*fx, *fy, *fz, *mx, *my, *mz))?;
            }
            LoadRecord::MemberDist {
                pattern,
                element_id,
                wx,
                wy,
                wz,
                coord,
            } => {
                let element =
                    lookup(&self.element_ids, *element_id, ModelFileError::UnknownElementId)?;
                let load = MemberLoad::Distributed {
                    wx: *wx,
                    wy: *wy,
                    wz: *wz,
                    coordinates: *coord,
                };
                self.frame.add_member_load(element, pattern, load)?;
            }
            LoadRecord::MemberPoint {
                pattern,
                element_id,
                force,
                dist,
                is_rel,
                dir,
                coord,
            } => {
                let element =
                    lookup(&self.element_ids, *element_id, ModelFileError::UnknownElementId)?;
                let Some(direction) = parse_direction(dir) else {
                    warn!(element = *element_id, direction = %dir, "unknown load direction, load skipped");
                    return Ok(());
                };
                let position = if *is_rel {
                    LoadPosition::Relative(*dist)
                } else {
                    LoadPosition::Absolute(*dist)
                };
                let load = MemberLoad::Point {
                    force: *force,
                    position,
                    direction,
                    coordinates: *coord,
                };
                self.frame.add_member_load(element, pattern, load)?;
            }
        }
        Ok(())
    }

    /// Results document of a solved case.
    #[must_use]
    pub fn results_document(&self, results: &AnalysisResults, elapsed: Duration) -> ResultsDocument {
        let mut displacements = BTreeMap::new();
        let mut reactions = BTreeMap::new();
        for (node, result) in results.nodes() {
            let id = self.node_label(node);
            displacements.insert(id, result.displacement.to_array());
            reactions.insert(id, result.reaction.to_array());
        }
        ResultsDocument {
            status: "SUCCESS",
            info: RunInfo {
                version: env!("CARGO_PKG_VERSION"),
                case_name: results.case().to_owned(),
                dofs: results.dof_count(),
                time_elapsed: format!("{:.4} sec", elapsed.as_secs_f64()),
                equilibrium_ok: results.equilibrium().balanced,
            },
            displacements,
            reactions,
            base_reaction: results.base_reaction().into(),
        }
    }

    /// Modal results document keyed by user node id.
    #[must_use]
    pub fn modal_document(
        &self,
        mass_source: &str,
        modal: &ModalResults,
        elapsed: Duration,
    ) -> ModalDocument {
        let periods = modal
            .modes()
            .iter()
            .map(|mode| PeriodRow {
                mode: mode.number,
                period: mode.period.is_finite().then_some(mode.period),
                frequency: mode.frequency,
                omega: mode.angular_frequency,
                eigen: mode.eigenvalue,
            })
            .collect();
        let participation_mass = modal
            .modes()
            .iter()
            .map(|mode| {
                let p = mode.participation;
                ParticipationRow {
                    mode: mode.number,
                    ux: p.ux,
                    sum_ux: p.sum_ux,
                    uy: p.uy,
                    sum_uy: p.sum_uy,
                    uz: p.uz,
                    sum_uz: p.sum_uz,
                    gamma_x: p.gamma_x,
                    gamma_y: p.gamma_y,
                    gamma_z: p.gamma_z,
                }
            })
            .collect();
        let mode_shapes = modal
            .modes()
            .iter()
            .map(|mode| {
                let shape = mode
                    .shape
                    .iter()
                    .map(|(node, displacement)| (self.node_label(*node), displacement.to_array()))
                    .collect();
                (format!("Mode {}", mode.number), shape)
            })
            .collect();
        let [x, y, z] = modal.total_mass();

        ModalDocument {
            status: "SUCCESS",
            info: ModalInfo {
                version: env!("CARGO_PKG_VERSION"),
                kind: "Modal Analysis",
                mass_source: mass_source.to_owned(),
                dofs: modal.dof_count(),
                free_dofs: modal.free_dof_count(),
                time_elapsed: format!("{:.4} sec", elapsed.as_secs_f64()),
            },
            tables: ModalTables {
                periods,
                participation_mass,
            },
            mode_shapes,
            assembled_mass: modal
                .assembled_masses()
                .map(|(node, mass)| (self.node_label(node), mass))
                .collect(),
            total_mass: TotalMass { x, y, z },
        }
    }

    /// Element matrices of a solved case keyed by user element id.
    #[must_use]
    pub fn matrices_document(&self, results: &AnalysisResults) -> BTreeMap<u32, ElementMatrices> {
        results
            .elements()
            .map(|(element, result)| {
                let id = self
                    .element_labels
                    .get(&element)
                    .copied()
                    .unwrap_or(element.index() as u32);
                debug!(element = id, "exporting element matrices");
                let matrices = ElementMatrices {
                    k: rows(&result.local_stiffness),
                    t: rows(&result.transformation),
                    fef: result.fixed_end_forces.iter().copied().collect(),
                };
                (id, matrices)
            })
            .collect()
    }
}

fn rows(matrix: &Matrix12) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

/// Metadata block of a results document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunInfo {
    /// Engine version.
    pub version: &'static str,
    /// Analysed load case.
    pub case_name: String,
    /// Total number of degrees of freedom.
    pub dofs: usize,
    /// Wall-clock time, such as `"0.0123 sec"`.
    pub time_elapsed: String,
    /// Outcome of the global equilibrium check.
    pub equilibrium_ok: bool,
}

/// Resultant of the reactions with moments about the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct BaseReaction {
    #[serde(rename = "Fx")]
    pub fx: f64,
    #[serde(rename = "Fy")]
    pub fy: f64,
    #[serde(rename = "Fz")]
    pub fz: f64,
    #[serde(rename = "Mx")]
    pub mx: f64,
    #[serde(rename = "My")]
    pub my: f64,
    #[serde(rename = "Mz")]
    pub mz: f64,
}

impl From<Wrench> for BaseReaction {
    fn from(value: Wrench) -> Self {
        Self {
            fx: value.fx,
            fy: value.fy,
            fz: value.fz,
            mx: value.mx,
            my: value.my,
            mz: value.mz,
        }
    }
}

/// Successful analysis output keyed by user node id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultsDocument {
    /// Always `"SUCCESS"`.
    pub status: &'static str,
    /// Run metadata.
    pub info: RunInfo,
    /// `[Ux, Uy, Uz, Rx, Ry, Rz]` per node.
    pub displacements: BTreeMap<u32, [f64; 6]>,
    /// `[Fx, Fy, Fz, Mx, My, Mz]` per node.
    pub reactions: BTreeMap<u32, [f64; 6]>,
    /// Sum of reactions.
    pub base_reaction: BaseReaction,
}

/// Metadata block of a modal results document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModalInfo {
    /// Engine version.
    pub version: &'static str,
    /// Always `"Modal Analysis"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Name of the mass source used.
    pub mass_source: String,
    /// Total number of degrees of freedom.
    pub dofs: usize,
    /// Unrestrained degrees of freedom.
    pub free_dofs: usize,
    /// Wall-clock time, such as `"0.0123 sec"`.
    pub time_elapsed: String,
}

/// Period table row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PeriodRow {
    /// Mode number.
    pub mode: usize,
    /// Period in seconds, `null` for rigid-body modes.
    #[serde(rename = "T")]
    pub period: Option<f64>,
    /// Frequency in Hz.
    #[serde(rename = "f")]
    pub frequency: f64,
    /// Circular frequency in rad/s.
    pub omega: f64,
    /// Eigenvalue ω².
    pub eigen: f64,
}

/// Mass participation table row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct ParticipationRow {
    pub mode: usize,
    #[serde(rename = "Ux")]
    pub ux: f64,
    #[serde(rename = "SumUx")]
    pub sum_ux: f64,
    #[serde(rename = "Uy")]
    pub uy: f64,
    #[serde(rename = "SumUy")]
    pub sum_uy: f64,
    #[serde(rename = "Uz")]
    pub uz: f64,
    #[serde(rename = "SumUz")]
    pub sum_uz: f64,
    #[serde(rename = "Gamma_x")]
    pub gamma_x: f64,
    #[serde(rename = "Gamma_y")]
    pub gamma_y: f64,
    #[serde(rename = "Gamma_z")]
    pub gamma_z: f64,
}

/// Tables of a modal results document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModalTables {
    /// Periods and frequencies per mode.
    pub periods: Vec<PeriodRow>,
    /// Mass participation per mode.
    pub participation_mass: Vec<ParticipationRow>,
}

/// Mass free to move along each global axis, in kilograms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct TotalMass {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Successful modal analysis output keyed by user node id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModalDocument {
    /// Always `"SUCCESS"`.
    pub status: &'static str,
    /// Run metadata.
    pub info: ModalInfo,
    /// Period and participation tables.
    pub tables: ModalTables,
    /// `[Ux, Uy, Uz, Rx, Ry, Rz]` per node, keyed by `"Mode n"`.
    pub mode_shapes: BTreeMap<String, BTreeMap<u32, [f64; 6]>>,
    /// Diagonal of the assembled mass matrix per node.
    pub assembled_mass: BTreeMap<u32, [f64; 6]>,
    /// Mass free to move along each axis.
    pub total_mass: TotalMass,
}

/// Glass-box matrices of one element.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElementMatrices {
    /// Local stiffness, row by row.
    pub k: Vec<Vec<f64>>,
    /// Transformation matrix, row by row.
    pub t: Vec<Vec<f64>>,
    /// Local fixed-end forces.
    pub fef: Vec<f64>,
}

/// Diagnostic carried by a failure document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    /// Diagnostic code such as `E301`.
    pub code: &'static str,
    /// Short title.
    pub title: &'static str,
    /// Description of this occurrence.
    pub desc: String,
    /// Suggested remedy.
    pub fix: &'static str,
}

/// Output written instead of results when a run fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureDocument {
    /// Always `"FAILED"`.
    pub status: &'static str,
    /// What went wrong.
    pub error: ErrorDetails,
}

impl FailureDocument {
    fn new(code: &'static str, title: &'static str, desc: String, fix: &'static str) -> Self {
        Self {
            status: "FAILED",
            error: ErrorDetails {
                code,
                title,
                desc,
                fix,
            },
        }
    }
}

impl From<&ModelFileError> for FailureDocument {
    fn from(error: &ModelFileError) -> Self {
        Self::new(error.code(), error.title(), error.to_string(), error.suggestion())
    }
}

impl From<&AnalysisError> for FailureDocument {
    fn from(error: &AnalysisError) -> Self {
        Self::new(error.code(), error.title(), error.to_string(), error.suggestion())
    }
}

/// Write any document as pretty JSON.
///
/// # Errors
///
/// Returns [`ModelFileError::Write`] when the file cannot be created or written.
pub fn write_json(path: &Path, document: &impl Serialize) -> Result<(), ModelFileError> {
    let write_error = |source: std::io::Error| ModelFileError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document)
        .map_err(|source| write_error(source.into()))?;
    writer.flush().map_err(write_error)?;
    info!(path = %path.display(), "document written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const CANTILEVER: &str = r#"{
        "materials": [{ "name": "Steel", "E": 2.0e11, "G": 7.6923e10, "rho": 0.0 }],
        "sections": [{ "name": "R", "mat_name": "Steel", "type": "rectangular", "b": 0.1, "h": 0.2 }],
        "nodes": [
            { "id": 20, "x": 2.0, "y": 0.0, "z": 0.0, "restraints": [false, false, false, false, false, false] },
            { "id": 10, "x": 0.0, "y": 0.0, "z": 0.0, "restraints": [true, true, true, true, true, true] }
        ],
        "elements": [{ "id": 7, "n1_id": 10, "n2_id": 20, "sec_name": "R", "beta": 0.0,
                       "rel_i": [false, false, false, false, false, false],
                       "rel_j": [false, false, false, false, false, false],
                       "off_i": [0, 0, 0], "off_j": [0, 0, 0], "cardinal": 10 }],
        "load_patterns": [{ "name": "DEAD", "type": "Dead", "sw_mult": 0.0 }],
        "load_cases": [{ "name": "DEAD", "type": "Linear Static", "loads": [["DEAD", 1.0]] }],
        "loads": [
            { "type": "nodal", "pattern": "DEAD", "node_id": 20,
              "fx": 0, "fy": 0, "fz": -5000, "mx": 0, "my": 0, "mz": 0 },
            { "type": "member_point", "pattern": "DEAD", "element_id": 7,
              "force": 1000, "dist": 0.5, "is_rel": true, "coord": "Global", "dir": "Gravity" }
        ]
    }"#;

    fn document(text: &str) -> ModelDocument {
        serde_json::from_str(text).expect("valid document")
    }

    #[test]
    fn nodes_are_inserted_in_id_order() {
        let model = document(CANTILEVER).build().expect("built");
        assert_eq!(model.node(10).map(NodeIndex::index), Some(0));
        assert_eq!(model.node(20).map(NodeIndex::index), Some(1));
        assert_eq!(model.node_labels()[&NodeIndex::new(1)], 20);
        assert!(model.element(7).is_some());
    }

    #[test]
    fn poisson_ratio_is_derived_from_shear_modulus() {
        let model = document(CANTILEVER).build().expect("built");
        let steel = model.frame().material("Steel").expect("registered");
        assert_relative_eq!(steel.poisson_ratio, 0.3, epsilon = 1.0e-4);
    }

    #[test]
    fn results_are_keyed_by_user_id() {
        let mut model = document(CANTILEVER).build().expect("built");
        let results = model.frame_mut().analyze("DEAD").expect("solved").clone();
        let output = model.results_document(&results, Duration::from_millis(12));
        assert_eq!(output.status, "SUCCESS");
        assert_eq!(output.info.time_elapsed, "0.0120 sec");
        assert_eq!(output.info.dofs, 12);
        assert_relative_eq!(output.reactions[&10][2], 6_000.0, epsilon = 1.0e-6);
        assert_relative_eq!(output.base_reaction.fz, 6_000.0, epsilon = 1.0e-6);
        assert!(output.displacements[&20][2] < 0.0);

        let json = serde_json::to_value(&output).expect("serializable");
        assert!(json["displacements"]["20"].is_array());
        assert!(json["base_reaction"]["My"].is_number());
    }

    #[test]
    fn matrices_document_exposes_glass_box() {
        let mut model = document(CANTILEVER).build().expect("built");
        let results = model.frame_mut().analyze("DEAD").expect("solved").clone();
        let matrices = model.matrices_document(&results);
        let element = &matrices[&7];
        assert_eq!(element.k.len(), 12);
        assert_eq!(element.t[0].len(), 12);
        assert_relative_eq!(element.fef[2], 500.0, epsilon = 1.0e-6);
    }

    #[test]
    fn dangling_references_are_reported() {
        let mut doc = document(CANTILEVER);
        doc.elements[0].n2_id = 99;
        let error = doc.build().expect_err("unknown node");
        assert!(matches!(error, ModelFileError::UnknownNodeId(99)));
        assert_eq!(error.code(), "E103");

        let mut doc = document(CANTILEVER);
        doc.elements[0].sec_name = "W".into();
        assert_eq!(doc.build().expect_err("unknown section").code(), "E103");
    }

    #[test]
    fn invalid_geometry_is_not_reported_as_missing_section() {
        let mut doc = document(CANTILEVER);
        doc.elements[0].end_off_i = -0.25;
        let error = doc.build().expect_err("negative rigid zone");
        assert_eq!(error.code(), "E204");
        assert_eq!(error.title(), "Invalid End Offset");

        let mut doc = document(CANTILEVER);
        if let LoadRecord::MemberPoint { dist, .. } = &mut doc.loads[1] {
            *dist = 1.5;
        }
        assert_eq!(doc.build().expect_err("beyond the span").code(), "E205");

        let mut doc = document(CANTILEVER);
        doc.load_cases[0].loads[0].0 = "WIND".into();
        assert_eq!(doc.build().expect_err("unknown pattern").code(), "E105");
    }

    #[test]
    fn modal_document_lists_periods_and_participation() {
        let mut doc = document(CANTILEVER);
        doc.materials[0].unit_weight = 76_900.0;
        let model = doc.build().expect("built");
        let modal = model.modal("Default", 3).expect("solved");
        let output = model.modal_document("Default", &modal, Duration::from_millis(3));

        assert_eq!(output.info.kind, "Modal Analysis");
        assert_eq!(output.info.free_dofs, 6);
        assert_eq!(output.tables.periods.len(), 3);
        let first = output.tables.participation_mass[0];
        assert!(first.uy > 0.999);
        assert!(output.tables.periods[0].period > output.tables.periods[1].period);
        let tip_mass = 0.02 * 76_900.0 / crate::mass::GRAVITY;
        assert_relative_eq!(output.total_mass.y, tip_mass, max_relative = 1.0e-12);
        assert_relative_eq!(output.assembled_mass[&20][1], tip_mass, max_relative = 1.0e-12);

        let json = serde_json::to_value(&output).expect("serializable");
        assert_eq!(json["info"]["type"], "Modal Analysis");
        assert!(json["tables"]["periods"][0]["T"].is_number());
        assert!(json["tables"]["participation_mass"][0]["SumUy"].is_number());
        assert!(json["mode_shapes"]["Mode 1"]["20"].is_array());
        assert_eq!(json["mode_shapes"]["Mode 1"]["10"][0], 0.0);
    }

    #[test]
    fn mass_sources_resolve_by_name() {
        let mut doc = document(CANTILEVER);
        let record: MassSourceRecord = serde_json::from_str(
            r#"{ "name": "MSSSRC1", "include_self_mass": false, "include_patterns": true,
                 "load_patterns": [["DEAD", 1.0]] }"#,
        )
        .expect("valid mass source");
        doc.mass_sources.push(record);
        let model = doc.build().expect("built");

        let source = model.mass_source("Default").expect("falls back to the first source");
        assert_eq!(source, model.mass_source("MSSSRC1").expect("named source"));
        assert!(!source.include_self_mass);
        assert_eq!(source.scale_of("DEAD"), Some(1.0));
        let error = model.mass_source("SEISMIC").expect_err("unknown source");
        assert_eq!(error, AnalysisError::UnknownMassSource("SEISMIC".into()));
        assert_eq!(error.code(), "E106");

        let modal = model.modal("MSSSRC1", 1).expect("solved");
        let mass = modal.assembled_mass(NodeIndex::new(1)).expect("tip is assembled");
        assert_relative_eq!(mass[2], 5_000.0 / crate::mass::GRAVITY, max_relative = 1.0e-12);
    }

    #[test]
    fn mass_source_defaults_follow_self_mass_only() {
        let record: MassSourceRecord =
            serde_json::from_str(r#"{ "name": "M", "load_patterns": [["DEAD", 1.0]] }"#)
                .expect("valid mass source");
        assert!(record.include_self_mass);
        assert!(!record.include_patterns);
        assert_eq!(record.to_mass_source(), MassSource::default());

        let model = document(CANTILEVER).build().expect("built");
        assert_eq!(model.mass_source("Default"), Ok(MassSource::default()));
        assert_eq!(
            model.modal("Default", 1).map(|_| ()),
            Err(AnalysisError::InvalidMassMatrix)
        );
    }

    #[test]
    fn duplicate_node_ids_are_rejected() {
        let mut doc = document(CANTILEVER);
        doc.nodes[0].id = 10;
        assert!(matches!(doc.build(), Err(ModelFileError::DuplicateId(10))));
    }

    #[test]
    fn material_without_elastic_constants_is_rejected() {
        let mut doc = document(CANTILEVER);
        doc.materials[0].shear_modulus = None;
        assert_eq!(doc.build().expect_err("incomplete").code(), "E102");
    }

    #[test]
    fn direction_labels_follow_loose_matching() {
        assert_eq!(parse_direction("Gravity"), Some(LoadDirection::Gravity));
        assert_eq!(parse_direction("Global X"), Some(LoadDirection::X));
        assert_eq!(parse_direction("Local 2"), Some(LoadDirection::Y));
        assert_eq!(parse_direction("z"), Some(LoadDirection::Z));
        assert_eq!(parse_direction("up"), None);
    }

    #[test]
    fn read_errors_carry_codes() {
        let missing = std::env::temp_dir().join("framex-missing-model.json");
        let _ = std::fs::remove_file(&missing);
        assert_eq!(ModelDocument::read(&missing).expect_err("missing").code(), "E101");

        let broken = std::env::temp_dir().join("framex-broken-model.json");
        std::fs::write(&broken, "{ \"nodes\": [ ").expect("writable temp dir");
        assert_eq!(ModelDocument::read(&broken).expect_err("broken").code(), "E102");
        let _ = std::fs::remove_file(&broken);
    }

    #[test]
    fn failure_document_carries_diagnostic() {
        let failure = FailureDocument::from(&AnalysisError::SingularStiffness);
        let json = serde_json::to_value(&failure).expect("serializable");
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["error"]["code"], "E301");
        assert_eq!(json["error"]["title"], "Structure is Unstable (Singular Matrix)");
    }

    #[test]
    fn documents_are_written_as_json() {
        let path = std::env::temp_dir().join("framex-failure-document.json");
        let failure = FailureDocument::from(&AnalysisError::UnknownLoadCase("LIVE".into()));
        write_json(&path, &failure).expect("written");
        let text = std::fs::read_to_string(&path).expect("readable");
        assert!(text.contains("\"E104\""));
        let _ = std::fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[test]
    fn full_device_reports_write_failure() {
        let failure = FailureDocument::from(&AnalysisError::SingularStiffness);
        let error = write_json(Path::new("/dev/full"), &failure).expect_err("device is full");
        assert!(matches!(error, ModelFileError::Write { .. }));
        assert_eq!(error.code(), "E401");
    }
}
