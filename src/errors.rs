//! Error types produced while editing, analysing or exchanging frame models.
//!
//! Analysis and file errors carry a short diagnostic code (`E1xx` input,
//! `E2xx` element definition, `E3xx` solution, `E4xx` output) together with a
//! human readable suggestion so front ends can present actionable feedback.

use std::path::PathBuf;

use petgraph::graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

/// Error returned when a material or section property is not physically meaningful.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum PropertyError {
    /// Returned when the cross-sectional area is zero or negative.
    #[error("area must be positive (received {area})")]
    NonPositiveArea {
        /// Rejected cross-sectional area in square metres.
        area: f64,
    },
    /// Returned when a second moment of area is zero or negative.
    #[error("moment of inertia {axis} must be positive (received {value})")]
    NonPositiveInertia {
        /// Name of the bending axis (`I22` or `I33`).
        axis: &'static str,
        /// Rejected value in metres to the fourth.
        value: f64,
    },
    /// Returned when a section dimension is zero or negative.
    #[error("section dimension {name} must be positive (received {value})")]
    NonPositiveDimension {
        /// Name of the offending dimension.
        name: &'static str,
        /// Rejected value in metres.
        value: f64,
    },
    /// Returned when the elastic modulus is zero or negative.
    #[error("elastic modulus must be positive (received {elastic_modulus})")]
    NonPositiveElasticModulus {
        /// Rejected elastic modulus in pascals.
        elastic_modulus: f64,
    },
    /// Returned when Poisson's ratio lies outside the open interval (-1, 0.5).
    #[error("poisson ratio must lie in (-1, 0.5) (received {poisson_ratio})")]
    InvalidPoissonRatio {
        /// Rejected ratio.
        poisson_ratio: f64,
    },
    /// Returned when the unit weight is negative.
    #[error("unit weight must not be negative (received {unit_weight})")]
    NegativeUnitWeight {
        /// Rejected unit weight in newtons per cubic metre.
        unit_weight: f64,
    },
}

/// Error returned when editing a [`Frame`](crate::Frame) with invalid indices or names.
///
/// # Examples
///
/// ```
/// use petgraph::graph::EdgeIndex;
/// use framex::{Frame, FrameEditError};
///
/// let mut frame = Frame::new();
/// let invalid_element = EdgeIndex::new(42);
/// let error = frame
///     .set_beta_angle(invalid_element, 90.0)
///     .expect_err("unknown element is rejected");
/// assert_eq!(error, FrameEditError::UnknownElement(invalid_element));
/// ```
#[derive(Debug, Error, PartialEq)]
pub enum FrameEditError {
    /// Returned when a node cannot be found in the frame.
    #[error("node {0:?} does not exist in this frame")]
    UnknownNode(NodeIndex),
    /// Returned when an element cannot be found in the frame.
    #[error("element {0:?} does not exist in this frame")]
    UnknownElement(EdgeIndex),
    /// Returned when a section references an unregistered material.
    #[error("material '{0}' is not defined")]
    UnknownMaterial(String),
    /// Returned when an element references an unregistered section.
    #[error("section '{0}' is not defined")]
    UnknownSection(String),
    /// Returned when a load or load case references an unregistered pattern.
    #[error("load pattern '{0}' is not defined")]
    UnknownLoadPattern(String),
    /// Returned when a rigid end offset is negative or not finite.
    #[error("end offset must be a finite, non-negative length (received {0})")]
    InvalidEndOffset(f64),
    /// Returned when a relative load position falls outside `[0, 1]`.
    #[error("relative load position must lie in [0, 1] (received {0})")]
    InvalidRelativePosition(f64),
    /// Returned when an absolute load position is negative or not finite.
    #[error("load position must be a finite, non-negative distance (received {0})")]
    InvalidAbsolutePosition(f64),
    /// Returned when supplied material or section properties are invalid.
    #[error("{0}")]
    InvalidProperty(#[from] PropertyError),
}

impl FrameEditError {
    /// Diagnostic code for this failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownNode(_)
            | Self::UnknownElement(_)
            | Self::UnknownMaterial(_)
            | Self::UnknownSection(_) => "E103",
            Self::UnknownLoadPattern(_) => "E105",
            Self::InvalidProperty(_) => "E202",
            Self::InvalidEndOffset(_) => "E204",
            Self::InvalidRelativePosition(_) | Self::InvalidAbsolutePosition(_) => "E205",
        }
    }
}

/// Error returned when a frame analysis fails.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Returned when the requested load case does not exist.
    #[error("load case '{0}' is not defined")]
    UnknownLoadCase(String),
    /// Returned when an element references a section that is not registered.
    #[error("element {element:?} references missing section '{section}'")]
    MissingSection {
        /// Identifier of the offending element.
        element: EdgeIndex,
        /// Name of the missing section.
        section: String,
    },
    /// Returned when a section references a material that is not registered.
    #[error("section '{section}' references missing material '{material}'")]
    MissingMaterial {
        /// Name of the section.
        section: String,
        /// Name of the missing material.
        material: String,
    },
    /// Returned when an element connects coincident points.
    #[error("element {0:?} has zero length")]
    ZeroLengthElement(EdgeIndex),
    /// Returned when rigid end offsets consume the whole element.
    #[error("element {element:?} has non-positive clear length {clear_length}")]
    NonPositiveClearLength {
        /// Identifier of the offending element.
        element: EdgeIndex,
        /// Total length minus both end offsets.
        clear_length: f64,
    },
    /// Returned when a section carries properties that cannot produce stiffness.
    #[error("section '{section}' has invalid properties: {source}")]
    InvalidSectionProperties {
        /// Name of the offending section.
        section: String,
        /// Description of the invalid property.
        #[source]
        source: PropertyError,
    },
    /// Returned when member releases leave an element internally unstable.
    #[error("element {0:?} has an unstable release configuration")]
    UnstableRelease(EdgeIndex),
    /// Returned when the stiffness matrix cannot be inverted.
    #[error("stiffness matrix is singular; check supports and connectivity")]
    SingularStiffness,
    /// Returned when the solution contains implausibly large displacements.
    #[error("node {node:?} displaces by {magnitude:e}; the structure is likely unstable")]
    ExcessiveDisplacement {
        /// Node carrying the largest displacement.
        node: NodeIndex,
        /// Magnitude of the offending component.
        magnitude: f64,
    },
    /// Returned when a mass source references an unregistered load pattern.
    #[error("load pattern '{0}' is not defined")]
    UnknownLoadPattern(String),
    /// Returned when the requested mass source does not exist.
    #[error("mass source '{0}' is not defined")]
    UnknownMassSource(String),
    /// Returned when a modal analysis is asked for zero modes.
    #[error("at least one mode must be requested")]
    NoModesRequested,
    /// Returned when a modal analysis finds no unrestrained degree of freedom.
    #[error("every degree of freedom is restrained; there are no modes to solve")]
    FullyRestrained,
    /// Returned when some free degree of freedom carries no mass.
    #[error("mass matrix is not positive definite on the free degrees of freedom")]
    InvalidMassMatrix,
}

impl AnalysisError {
    /// Diagnostic code for this failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSection { .. } | Self::MissingMaterial { .. } => "E103",
            Self::UnknownLoadCase(_) => "E104",
            Self::UnknownLoadPattern(_) => "E105",
            Self::UnknownMassSource(_) => "E106",
            Self::ZeroLengthElement(_) | Self::NonPositiveClearLength { .. } => "E201",
            Self::InvalidSectionProperties { .. } => "E202",
            Self::UnstableRelease(_) => "E203",
            Self::SingularStiffness => "E301",
            Self::ExcessiveDisplacement { .. } => "E302",
            Self::InvalidMassMatrix => "E303",
            Self::NoModesRequested | Self::FullyRestrained => "E304",
        }
    }

    /// Short title for this failure.
    #[must_use]
    pub fn title(&self) -> &'static str {
        title_for(self.code())
    }

    /// Suggested remedy for this failure.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        suggestion_for(self.code())
    }
}

/// Error returned while reading, building or writing model documents.
#[derive(Debug, Error)]
pub enum ModelFileError {
    /// Returned when the input file cannot be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// Path of the input document.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the input is not a valid model document.
    #[error("invalid model document {}: {source}", .path.display())]
    Parse {
        /// Path of the input document.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// Returned when an element or load references an undefined node id.
    #[error("node id {0} is not defined")]
    UnknownNodeId(u32),
    /// Returned when a load references an undefined element id.
    #[error("element id {0} is not defined")]
    UnknownElementId(u32),
    /// Returned when two nodes or two elements share an id.
    #[error("duplicate id {0}")]
    DuplicateId(u32),
    /// Returned when a material gives neither Poisson's ratio nor a shear modulus.
    #[error("material '{0}' needs \"nu\" or \"G\"")]
    IncompleteMaterial(String),
    /// Returned when the document describes an invalid model.
    #[error(transparent)]
    Edit(#[from] FrameEditError),
    /// Returned when an output document cannot be written.
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        /// Path of the output document.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl ModelFileError {
    /// Diagnostic code for this failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "E101",
            Self::Parse { .. } | Self::IncompleteMaterial(_) => "E102",
            Self::UnknownNodeId(_) | Self::UnknownElementId(_) | Self::DuplicateId(_) => "E103",
            Self::Edit(error) => error.code(),
            Self::Write { .. } => "E401",
        }
    }

    /// Short title for this failure.
    #[must_use]
    pub fn title(&self) -> &'static str {
        title_for(self.code())
    }

    /// Suggested remedy for this failure.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        suggestion_for(self.code())
    }
}

/// Look up the title for a diagnostic code.
fn title_for(code: &str) -> &'static str {
    match code {
        "E101" => "Input File Not Found",
        "E102" => "Invalid JSON Format",
        "E103" => "Missing Material or Section",
        "E104" => "Load Case Not Found",
        "E105" => "Load Pattern Not Found",
        "E106" => "Mass Source Not Found",
        "E201" => "Zero Length Element",
        "E202" => "Invalid Section Properties",
        "E203" => "Unstable Release Configuration",
        "E204" => "Invalid End Offset",
        "E205" => "Invalid Load Position",
        "E301" => "Structure is Unstable (Singular Matrix)",
        "E302" => "Huge Displacements Detected",
        "E303" => "Invalid Mass Matrix",
        "E304" => "No Modes to Solve",
        "E401" => "Result Write Failure",
        _ => "Unknown System Error",
    }
}

/// Look up the remedy for a diagnostic code.
fn suggestion_for(code: &str) -> &'static str {
    match code {
        "E101" => "Ensure the file path is correct and the file exists.",
        "E102" => "Check the document for missing braces, wrong field names or syntax errors.",
        "E103" => "Ensure every element references a defined section, node and material.",
        "E104" => "Check the spelling of the load case or define it in the model.",
        "E105" => "Define the load pattern before using it in a load, load case or mass source.",
        "E106" => "Check the spelling of the mass source or define it in the model.",
        "E201" => "Check node coordinates and end offsets; delete or merge coincident nodes.",
        "E202" => "Area and both moments of inertia must be positive values.",
        "E203" => "Do not release the same degree of freedom at both ends of an element.",
        "E204" => "Rigid end offsets must be finite, non-negative lengths.",
        "E205" => "Relative positions must lie in [0, 1]; absolute positions must be finite and non-negative.",
        "E301" => "Check supports, disconnected nodes and the number of internal releases.",
        "E302" => "Check units and make sure the model is restrained against rotation.",
        "E303" => "Include self mass or load pattern mass so every free joint carries mass.",
        "E304" => "Request at least one mode and leave at least one joint unrestrained.",
        "E401" => "Check folder write permissions and that the file is not locked.",
        _ => "Re-run with RUST_LOG=debug and inspect the log.",
    }
}
