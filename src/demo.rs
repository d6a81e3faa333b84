use framex::{
    force, point, AnalysisError, Frame, FrameEditError, IDimensions, LoadCase, LoadPattern,
    Material, MemberLoad, Restraint, Section, Wrench,
};
use petgraph::graph::{EdgeIndex, NodeIndex};

/// Name of the combined load case solved by the demonstration.
pub const DEMO_CASE: &str = "ULS";

/// Handles to the parts of the portal frame used later in the analysis.
#[derive(Debug, Clone, Copy)]
pub struct PortalGeometry {
    /// Fixed base of the left column.
    pub left_base: NodeIndex,
    /// Top of the left column, where the lateral load acts.
    pub left_knee: NodeIndex,
    /// Top of the right column.
    pub right_knee: NodeIndex,
    /// Fixed base of the right column.
    pub right_base: NodeIndex,
    /// Horizontal beam joining the knees.
    pub beam: EdgeIndex,
}

/// Dimensions and loads of the portal frame demonstration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalProperties {
    /// Column height in metres.
    pub height: f64,
    /// Beam span in metres.
    pub span: f64,
    /// Superimposed dead load on the beam in N/m.
    pub dead_load: f64,
    /// Live load on the beam in N/m.
    pub live_load: f64,
    /// Lateral live load at the left knee in N.
    pub lateral_load: f64,
    /// Dead load factor of the combination.
    pub dead_factor: f64,
    /// Live load factor of the combination.
    pub live_factor: f64,
}

impl Default for PortalProperties {
    fn default() -> Self {
        Self {
            height: 3.0,
            span: 6.0,
            dead_load: 5_000.0,
            live_load: 10_000.0,
            lateral_load: 5_000.0,
            dead_factor: 1.2,
            live_factor: 1.6,
        }
    }
}

/// Build a fixed-base steel portal frame in the global X-Z plane.
pub fn build_portal_frame(
    properties: &PortalProperties,
) -> Result<(Frame, PortalGeometry), FrameEditError> {
    let mut frame = Frame::new();
    frame.add_material("S275", Material::new(200.0e9, 0.3, 76.9e3)?.with_yield_strength(275.0e6))?;
    frame.add_section(
        "IPE300",
        Section::i_shape("S275", IDimensions::symmetric(0.3, 0.15, 0.0107, 0.0071))?,
    )?;

    let PortalProperties { height, span, .. } = *properties;
    let left_base = frame.add_node(point(0.0, 0.0, 0.0));
    let left_knee = frame.add_node(point(0.0, 0.0, height));
    let right_knee = frame.add_node(point(span, 0.0, height));
    let right_base = frame.add_node(point(span, 0.0, 0.0));

    frame.add_element(left_base, left_knee, "IPE300")?;
    let beam = frame.add_element(left_knee, right_knee, "IPE300")?;
    frame.add_element(right_base, right_knee, "IPE300")?;

    Ok((
        frame,
        PortalGeometry {
            left_base,
            left_knee,
            right_knee,
            right_base,
            beam,
        },
    ))
}

/// Apply supports, load patterns and the factored combination.
pub fn apply_portal_conditions(
    frame: &mut Frame,
    geometry: &PortalGeometry,
    properties: &PortalProperties,
) -> Result<(), FrameEditError> {
    frame.set_restraint(geometry.left_base, Restraint::FIXED)?;
    frame.set_restraint(geometry.right_base, Restraint::FIXED)?;

    frame.add_load_pattern(
        "DEAD",
        LoadPattern {
            self_weight_multiplier: 1.0,
        },
    );
    frame.add_load_pattern("LIVE", LoadPattern::default());

    frame.add_member_load(
        geometry.beam,
        "DEAD",
        MemberLoad::uniform(0.0, 0.0, -properties.dead_load),
    )?;
    frame.add_member_load(
        geometry.beam,
        "LIVE",
        MemberLoad::uniform(0.0, 0.0, -properties.live_load),
    )?;
    frame.add_nodal_load(
        geometry.left_knee,
        "LIVE",
        force(properties.lateral_load, 0.0, 0.0),
    )?;

    frame.add_load_case(
        DEMO_CASE,
        LoadCase::new()
            .with_pattern("DEAD", properties.dead_factor)
            .with_pattern("LIVE", properties.live_factor),
    )
}

/// Key responses of the portal frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalSummary {
    /// Mean horizontal displacement of the knees in metres.
    pub sway: f64,
    /// Bending moment about local 2 at the start of the beam.
    pub beam_end_moment: f64,
    /// Resultant of the base reactions.
    pub base_reaction: Wrench,
    /// Whether the global equilibrium check passed.
    pub balanced: bool,
}

/// Solve the combination and extract the summary values.
pub fn run_portal_analysis(
    frame: &mut Frame,
    geometry: &PortalGeometry,
) -> Result<PortalSummary, AnalysisError> {
    let results = frame.analyze(DEMO_CASE)?;
    let sway = [geometry.left_knee, geometry.right_knee]
        .into_iter()
        .filter_map(|knee| results.displacement(knee))
        .map(|displacement| displacement.ux)
        .sum::<f64>()
        / 2.0;
    let beam_end_moment = results
        .element(geometry.beam)
        .map_or(0.0, |beam| beam.start_forces().my);

    Ok(PortalSummary {
        sway,
        beam_end_moment,
        base_reaction: results.base_reaction(),
        balanced: results.equilibrium().balanced,
    })
}
