#![warn(clippy::all)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod deflection;
pub mod element;
mod errors;
pub mod features;
mod frame;
mod geometry;
mod loads;
pub mod mass;
mod modal;
pub mod model_file;
pub mod report;
mod results;
mod section;
pub mod units;

pub use element::EndReleases;
pub use errors::{AnalysisError, FrameEditError, ModelFileError, PropertyError};
pub use frame::{Frame, Restraint, DISPLACEMENT_LIMIT};
pub use geometry::{force, point, Displacement, Point, Wrench};
pub use loads::{
    point_fixed_end_forces, timoshenko_shape_values, uniform_fixed_end_forces, CoordinateSystem,
    LoadCase, LoadDirection, LoadPattern, LoadPosition, MemberLoad,
};
pub use mass::{MassDistribution, MassSource};
pub use modal::{ModalParticipation, ModalResults, Mode};
pub use results::{
    AnalysisResults, ElementResult, EquilibriumCheck, NodeResult, EQUILIBRIUM_TOLERANCE,
};
pub use section::{CardinalPoint, IDimensions, Material, Section, SectionProperties, SectionShape};
