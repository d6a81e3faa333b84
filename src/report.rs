//! Plain-text summaries of an analysed load case and of a modal analysis.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::NodeIndex;

use crate::geometry::Wrench;
use crate::modal::ModalResults;
use crate::results::AnalysisResults;
use crate::units::UnitSystem;

/// Printable report of one load case.
///
/// Displacements and reactions are shown in the chosen display units; node
/// labels default to graph indices unless user ids are supplied.
///
/// # Examples
/// ```
/// use framex::report::CaseReport;
/// use framex::units::UnitSystem;
/// use framex::{force, point, Frame, LoadPattern, Material, Restraint, Section};
///
/// let mut frame = Frame::new();
/// frame.add_material("Steel", Material::new(200.0e9, 0.3, 0.0).unwrap()).unwrap();
/// frame.add_section("R", Section::rectangular("Steel", 0.1, 0.2).unwrap()).unwrap();
/// frame.add_load_pattern("DEAD", LoadPattern::default());
/// let a = frame.add_node(point(0.0, 0.0, 0.0));
/// let b = frame.add_node(point(1.0, 0.0, 0.0));
/// frame.set_restraint(a, Restraint::FIXED).unwrap();
/// frame.add_element(a, b, "R").unwrap();
/// frame.add_nodal_load(b, "DEAD", force(0.0, 0.0, -1_000.0)).unwrap();
///
/// let results = frame.analyze("DEAD").unwrap();
/// let text = CaseReport::new(results, UnitSystem::default()).to_string();
/// assert!(text.contains("Load case DEAD"));
/// assert!(text.contains("Equilibrium: OK"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct CaseReport<'a> {
    results: &'a AnalysisResults,
    units: UnitSystem,
    labels: Option<&'a HashMap<NodeIndex, u32>>,
}

impl<'a> CaseReport<'a> {
    /// Report `results` in `units`.
    #[must_use]
    pub fn new(results: &'a AnalysisResults, units: UnitSystem) -> Self {
        Self {
            results,
            units,
            labels: None,
        }
    }

    /// Label nodes with user ids instead of graph indices.
    #[must_use]
    pub fn with_node_labels(mut self, labels: &'a HashMap<NodeIndex, u32>) -> Self {
        self.labels = Some(labels);
        self
    }

    fn label(&self, node: NodeIndex) -> String {
        self.labels
            .and_then(|labels| labels.get(&node))
            .map_or_else(|| node.index().to_string(), u32::to_string)
    }

    fn write_wrench(&self, f: &mut fmt::Formatter<'_>, wrench: Wrench) -> fmt::Result {
        let u = self.units;
        write!(
            f,
            "{:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            u.to_display_force(wrench.fx),
            u.to_display_force(wrench.fy),
            u.to_display_force(wrench.fz),
            u.to_display_moment(wrench.mx),
            u.to_display_moment(wrench.my),
            u.to_display_moment(wrench.mz),
        )
    }
}

impl fmt::Display for CaseReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let results = self.results;
        let u = self.units;
        let length = u.length.symbol();
        let force = u.force.symbol();
        let moment = u.moment_label();

        writeln!(
            f,
            "Load case {} ({} degrees of freedom, units {u})",
            results.case(),
            results.dof_count()
        )?;

        writeln!(f, "\nDisplacements [{length}, rad]")?;
        writeln!(
            f,
            "{:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "Node", "Ux", "Uy", "Uz", "Rx", "Ry", "Rz"
        )?;
        for (node, result) in results.nodes() {
            let d = result.displacement;
            writeln!(
                f,
                "{:>6} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e}",
                self.label(node),
                u.to_display_length(d.ux),
                u.to_display_length(d.uy),
                u.to_display_length(d.uz),
                d.rx,
                d.ry,
                d.rz,
            )?;
        }

        writeln!(f, "\nReactions [{force}, {moment}]")?;
        writeln!(
            f,
            "{:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "Node", "Fx", "Fy", "Fz", "Mx", "My", "Mz"
        )?;
        for (node, result) in results.nodes().filter(|(_, r)| r.restraint.is_support()) {
            write!(f, "{:>6} ", self.label(node))?;
            self.write_wrench(f, result.reaction)?;
            writeln!(f)?;
        }

        let equilibrium = results.equilibrium();
        write!(f, "\n{:>6} ", "Base")?;
        self.write_wrench(f, results.base_reaction())?;
        writeln!(f)?;
        write!(f, "{:>6} ", "Load")?;
        self.write_wrench(f, equilibrium.applied)?;
        writeln!(f)?;

        let verdict = if equilibrium.balanced { "OK" } else { "FAILED" };
        writeln!(
            f,
            "\nEquilibrium: {verdict} (largest residual {:.3e})",
            equilibrium.residual.max_abs()
        )?;
        write!(
            f,
            "Maximum displacement component: {:.4e}",
            results.max_displacement()
        )
    }
}

/// Printable period and mass participation tables of a modal analysis.
#[derive(Clone, Copy, Debug)]
pub struct ModalReport<'a> {
    modal: &'a ModalResults,
}

impl<'a> ModalReport<'a> {
    /// Report `modal`.
    #[must_use]
    pub fn new(modal: &'a ModalResults) -> Self {
        Self { modal }
    }
}

impl fmt::Display for ModalReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modal = self.modal;
        let [mx, my, mz] = modal.total_mass();
        writeln!(
            f,
            "Modal analysis: {} modes, {} free of {} degrees of freedom",
            modal.modes().len(),
            modal.free_dof_count(),
            modal.dof_count()
        )?;
        writeln!(f, "Total mass [kg]: X {mx:.3}, Y {my:.3}, Z {mz:.3}")?;

        writeln!(
            f,
            "\n{:>5} {:>12} {:>12} {:>12} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "Mode", "T [s]", "f [Hz]", "ω [rad/s]", "Ux", "Uy", "Uz", "SumUx", "SumUy", "SumUz"
        )?;
        for mode in modal.modes() {
            let p = mode.participation;
            let period = if mode.period.is_finite() {
                format!("{:.4}", mode.period)
            } else {
                "rigid".to_owned()
            };
            writeln!(
                f,
                "{:>5} {:>12} {:>12.4} {:>12.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>8.4}",
                mode.number,
                period,
                mode.frequency,
                mode.angular_frequency,
                p.ux,
                p.uy,
                p.uz,
                p.sum_ux,
                p.sum_uy,
                p.sum_uz,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, Restraint};
    use crate::geometry::{force, point};
    use crate::loads::LoadPattern;
    use crate::section::{Material, Section};

    fn solved_frame() -> (Frame, NodeIndex) {
        let mut frame = Frame::new();
        frame
            .add_material("Steel", Material::new(200.0e9, 0.3, 0.0).expect("valid"))
            .expect("material");
        frame
            .add_section("R", Section::rectangular("Steel", 0.1, 0.2).expect("valid"))
            .expect("section");
        frame.add_load_pattern("DEAD", LoadPattern::default());
        let a = frame.add_node(point(0.0, 0.0, 0.0));
        let b = frame.add_node(point(2.0, 0.0, 0.0));
        frame.set_restraint(a, Restraint::FIXED).expect("fixed");
        frame.add_element(a, b, "R").expect("element");
        frame
            .add_nodal_load(b, "DEAD", force(0.0, 0.0, -5_000.0))
            .expect("load");
        frame.analyze("DEAD").expect("solved");
        (frame, a)
    }

    #[test]
    fn reactions_are_listed_in_display_units() {
        let (frame, _) = solved_frame();
        let results = frame.results("DEAD").expect("cached");
        let text = CaseReport::new(results, UnitSystem::default()).to_string();
        assert!(text.contains("Reactions [kN, kN·m]"));
        assert!(text.contains("5.0000"));
        assert!(text.contains("-10.0000"));
        assert!(text.contains("Equilibrium: OK"));
    }

    #[test]
    fn user_labels_replace_graph_indices() {
        let (frame, base) = solved_frame();
        let results = frame.results("DEAD").expect("cached");
        let labels = HashMap::from([(base, 101_u32)]);
        let text = CaseReport::new(results, "N, mm".parse().expect("units"))
            .with_node_labels(&labels)
            .to_string();
        assert!(text.contains("   101 "));
        assert!(text.contains("units N, mm"));
    }

    #[test]
    fn modal_report_lists_every_mode() {
        let mut frame = Frame::new();
        frame
            .add_material("Steel", Material::new(200.0e9, 0.3, 76.9e3).expect("valid"))
            .expect("material");
        frame
            .add_section("R", Section::rectangular("Steel", 0.1, 0.2).expect("valid"))
            .expect("section");
        let a = frame.add_node(point(0.0, 0.0, 0.0));
        let b = frame.add_node(point(2.0, 0.0, 0.0));
        frame.set_restraint(a, Restraint::FIXED).expect("fixed");
        frame.add_element(a, b, "R").expect("element");
        let modal = frame
            .modal(&crate::MassSource::default(), 3)
            .expect("solved");

        let text = ModalReport::new(&modal).to_string();
        assert!(text.starts_with("Modal analysis: 3 modes, 6 free of 12 degrees of freedom"));
        assert_eq!(text.lines().count(), 7);
        assert!(text.lines().nth(4).is_some_and(|row| row.trim_start().starts_with("1 ")));
        assert!(!text.contains("rigid"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let (frame, _) = solved_frame();
        let results = frame.results("DEAD").expect("cached");
        let report = CaseReport::new(results, UnitSystem::default());
        assert_eq!(report.to_string(), report.to_string());
    }
}
