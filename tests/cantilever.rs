#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use petgraph::graph::{EdgeIndex, NodeIndex};
use framex::{
    force, point, Frame, LoadPattern, MassDistribution, MassSource, Material, Restraint, Section,
    SectionProperties,
};

#[derive(Debug, Clone, Copy)]
struct CantileverGeometry {
    fixed_joint: NodeIndex,
    loaded_joint: NodeIndex,
    member: EdgeIndex,
}

#[derive(Debug, Clone, Copy)]
struct CantileverProperties {
    length: f64,
    width: f64,
    depth: f64,
    elastic_modulus: f64,
    poisson_ratio: f64,
    tip_load: f64,
}

impl Default for CantileverProperties {
    fn default() -> Self {
        Self {
            length: 2.0,
            width: 0.1,
            depth: 0.2,
            elastic_modulus: 200.0e9,
            poisson_ratio: 0.3,
            tip_load: -5_000.0,
        }
    }
}

fn build_cantilever_frame(properties: &CantileverProperties) -> (Frame, CantileverGeometry) {
    let mut frame = Frame::new();
    frame
        .add_material(
            "Steel",
            Material::new(properties.elastic_modulus, properties.poisson_ratio, 0.0)
                .expect("valid material"),
        )
        .expect("material registration succeeds");
    frame
        .add_section(
            "Bar",
            Section::rectangular("Steel", properties.width, properties.depth)
                .expect("valid section"),
        )
        .expect("section registration succeeds");

    let fixed_joint = frame.add_node(point(0.0, 0.0, 0.0));
    let loaded_joint = frame.add_node(point(properties.length, 0.0, 0.0));
    let member = frame
        .add_element(fixed_joint, loaded_joint, "Bar")
        .expect("element creation succeeds");

    (
        frame,
        CantileverGeometry {
            fixed_joint,
            loaded_joint,
            member,
        },
    )
}

fn apply_cantilever_conditions(
    frame: &mut Frame,
    geometry: &CantileverGeometry,
    properties: &CantileverProperties,
) {
    frame
        .set_restraint(geometry.fixed_joint, Restraint::FIXED)
        .expect("fixed joint support assignment succeeds");
    frame.add_load_pattern("TIP", LoadPattern::default());
    frame
        .add_nodal_load(
            geometry.loaded_joint,
            "TIP",
            force(0.0, 0.0, properties.tip_load),
        )
        .expect("tip load assignment succeeds");
}

#[test]
fn builds_expected_topology() {
    let (frame, geometry) = build_cantilever_frame(&CantileverProperties::default());

    assert_eq!(frame.node_count(), 2);
    assert_eq!(frame.element_count(), 1);
    assert_eq!(geometry.fixed_joint.index(), 0);
    assert_eq!(geometry.loaded_joint.index(), 1);
    assert_eq!(geometry.member.index(), 0);
}

#[test]
fn cantilever_response_matches_timoshenko_solution() {
    let properties = CantileverProperties::default();
    let (mut frame, geometry) = build_cantilever_frame(&properties);
    apply_cantilever_conditions(&mut frame, &geometry, &properties);

    let section = frame.section("Bar").expect("registered").properties;
    let shear_modulus = properties.elastic_modulus / (2.0 * (1.0 + properties.poisson_ratio));
    let results = frame.analyze("TIP").expect("cantilever analysis succeeds");

    let p = properties.tip_load;
    let l = properties.length;
    let ei = properties.elastic_modulus * section.i22;
    let bending = p * l.powi(3) / (3.0 * ei);
    let shear = p * l / (shear_modulus * section.shear_area_3);

    let tip = results
        .displacement(geometry.loaded_joint)
        .expect("tip displacement available");
    assert_relative_eq!(tip.uz, bending + shear, max_relative = 1.0e-9);
    assert_relative_eq!(tip.ry, -p * l * l / (2.0 * ei), max_relative = 1.0e-9);
    assert!(tip.ux.abs() < 1.0e-15);
    assert!(tip.uy.abs() < 1.0e-15);

    let reaction = results
        .reaction(geometry.fixed_joint)
        .expect("support reaction available");
    assert_relative_eq!(reaction.fz, -p, max_relative = 1.0e-9);
    assert_relative_eq!(reaction.my, p * l, max_relative = 1.0e-9);

    let member = results.element(geometry.member).expect("element results");
    assert_relative_eq!(member.start_forces().fz, -p, max_relative = 1.0e-9);
    assert!(results.equilibrium().balanced);
}

#[test]
fn rigid_zone_at_the_support_shortens_the_flexible_span() {
    let properties = CantileverProperties::default();
    let (mut frame, geometry) = build_cantilever_frame(&properties);
    apply_cantilever_conditions(&mut frame, &geometry, &properties);
    let rigid = 0.5;
    frame
        .set_end_offsets(geometry.member, rigid, 0.0)
        .expect("rigid zone assignment succeeds");

    let section = frame.section("Bar").expect("registered").properties;
    let shear_modulus = properties.elastic_modulus / (2.0 * (1.0 + properties.poisson_ratio));
    let results = frame.analyze("TIP").expect("cantilever analysis succeeds");

    let p = properties.tip_load;
    let l = properties.length;
    let clear = l - rigid;
    let ei = properties.elastic_modulus * section.i22;
    let tip = results
        .displacement(geometry.loaded_joint)
        .expect("tip displacement available");
    assert_relative_eq!(
        tip.uz,
        p * clear.powi(3) / (3.0 * ei) + p * clear / (shear_modulus * section.shear_area_3),
        max_relative = 1.0e-9
    );
    assert_relative_eq!(tip.ry, -p * clear * clear / (2.0 * ei), max_relative = 1.0e-9);

    // The support still resists the load over the full lever arm.
    let reaction = results
        .reaction(geometry.fixed_joint)
        .expect("support reaction available");
    assert_relative_eq!(reaction.fz, -p, max_relative = 1.0e-9);
    assert_relative_eq!(reaction.my, p * l, max_relative = 1.0e-9);

    let member = results.element(geometry.member).expect("element results");
    assert_relative_eq!(member.clear_length, clear, max_relative = 1.0e-12);
    assert_relative_eq!(member.start_forces().my.abs(), p.abs() * clear, max_relative = 1.0e-9);
    assert!(results.equilibrium().balanced);
}

#[test]
fn axial_load_matches_closed_form_solution() {
    let properties = CantileverProperties::default();
    let (mut frame, geometry) = build_cantilever_frame(&properties);
    frame
        .set_restraint(geometry.fixed_joint, Restraint::FIXED)
        .expect("fixed joint support assignment succeeds");
    frame.add_load_pattern("AXIAL", LoadPattern::default());
    frame
        .add_nodal_load(geometry.loaded_joint, "AXIAL", force(-1_000.0, 0.0, 0.0))
        .expect("axial load assignment succeeds");

    let area = properties.width * properties.depth;
    let results = frame.analyze("AXIAL").expect("analysis succeeds");
    let tip = results
        .displacement(geometry.loaded_joint)
        .expect("tip displacement available");

    assert_relative_eq!(
        tip.ux,
        -1_000.0 * properties.length / (area * properties.elastic_modulus),
        max_relative = 1.0e-9
    );
    assert!(tip.uz.abs() < 1.0e-15);
}

#[test]
fn deflected_shape_passes_through_both_ends() {
    let properties = CantileverProperties::default();
    let (mut frame, geometry) = build_cantilever_frame(&properties);
    apply_cantilever_conditions(&mut frame, &geometry, &properties);
    let results = frame.analyze("TIP").expect("analysis succeeds");

    let tip = results
        .displacement(geometry.loaded_joint)
        .expect("tip displacement available");
    let shape = results
        .deflected_shape(geometry.member, 1.0, 11)
        .expect("shape available");

    assert_eq!(shape.len(), 11);
    assert_relative_eq!(shape[0].position.z, 0.0, epsilon = 1.0e-15);
    assert_relative_eq!(shape[10].position.z, tip.uz, max_relative = 1.0e-9);
    assert!(shape.windows(2).all(|pair| pair[1].position.z <= pair[0].position.z));
}

#[test]
fn meshed_cantilever_first_mode_converges_to_continuous_beam() {
    let properties = CantileverProperties::default();
    let unit_weight = 76.9e3;
    let segments: u32 = 8;
    let area = properties.width * properties.depth;
    // Euler-Bernoulli section: zero shear areas switch off shear deformation.
    let section = SectionProperties::new(area, 1.0e-5, 6.667e-5, 1.667e-5, 0.0, 0.0);

    let mut frame = Frame::new();
    frame
        .add_material(
            "Steel",
            Material::new(properties.elastic_modulus, properties.poisson_ratio, unit_weight)
                .expect("valid material"),
        )
        .expect("material registration succeeds");
    frame
        .add_section("Bar", Section::general("Steel", section).expect("valid section"))
        .expect("section registration succeeds");
    let joints: Vec<NodeIndex> = (0..=segments)
        .map(|i| {
            let x = properties.length * f64::from(i) / f64::from(segments);
            frame.add_node(point(x, 0.0, 0.0))
        })
        .collect();
    for pair in joints.windows(2) {
        frame
            .add_element(pair[0], pair[1], "Bar")
            .expect("element creation succeeds");
    }
    frame
        .set_restraint(joints[0], Restraint::FIXED)
        .expect("fixed joint support assignment succeeds");

    let source = MassSource::default().with_distribution(MassDistribution::Consistent);
    let modal = frame.modal(&source, 1).expect("modal analysis succeeds");

    let mass_per_length = area * unit_weight / framex::mass::GRAVITY;
    let exact = 1.875_104_f64.powi(2)
        * (properties.elastic_modulus * 1.667e-5
            / (mass_per_length * properties.length.powi(4)))
        .sqrt();
    let first = &modal.modes()[0];
    assert_relative_eq!(first.angular_frequency, exact, max_relative = 5.0e-3);
    assert!(first.participation.uy > 0.6);
    let tip = joints.last().expect("mesh has joints");
    assert!(first.shape[tip].uy > 0.0);
}
