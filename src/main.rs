mod demo;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use framex::features::{render_features_page, DefaultShell};
use framex::model_file::{load_model, write_json, FailureDocument};
use framex::report::{CaseReport, ModalReport};
use framex::units::UnitSystem;
use tracing::{error, info};

use demo::{apply_portal_conditions, build_portal_frame, run_portal_analysis, PortalProperties, DEMO_CASE};

/// Linear static analysis of 3D frames with every intermediate matrix exposed.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a JSON model document and write a results document.
    Analyze {
        /// Model document to read.
        input: PathBuf,
        /// Load case to solve.
        #[arg(long, default_value = "DEAD")]
        case: String,
        /// Results document; defaults to `<input>_results.json`.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also write element stiffness, transformation and FEF matrices here.
        #[arg(long)]
        matrices: Option<PathBuf>,
        /// Display units of the printed report, such as "kN, m".
        #[arg(long, default_value = "kN, m")]
        units: UnitSystem,
    },
    /// Solve the natural modes of a JSON model document.
    Modal {
        /// Model document to read.
        input: PathBuf,
        /// Number of modes to solve.
        #[arg(long, default_value_t = 12)]
        modes: usize,
        /// Mass source defined in the document.
        #[arg(long, default_value = "Default")]
        mass_source: String,
        /// Results document; defaults to `<input>_modal.json`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Solve a built-in steel portal frame and print the report.
    Demo {
        /// Display units of the printed report.
        #[arg(long, default_value = "kN, m")]
        units: UnitSystem,
    },
    /// Render the features page as HTML.
    Features {
        /// Destination file; printed to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Analyze {
            input,
            case,
            output,
            matrices,
            units,
        } => {
            let output = output.unwrap_or_else(|| default_output(&input, "results"));
            analyze(&input, &case, &output, matrices.as_deref(), units)
        }
        Command::Modal {
            input,
            modes,
            mass_source,
            output,
        } => {
            let output = output.unwrap_or_else(|| default_output(&input, "modal"));
            modal(&input, modes, &mass_source, &output)
        }
        Command::Demo { units } => run_demo(units),
        Command::Features { output } => features(output.as_deref()),
    }
}

/// `model.json` becomes `model_<suffix>.json` next to the input.
fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "model".into(), |stem| stem.to_string_lossy());
    input.with_file_name(format!("{stem}_{suffix}.json"))
}

fn analyze(
    input: &Path,
    case: &str,
    output: &Path,
    matrices: Option<&Path>,
    units: UnitSystem,
) -> Result<()> {
    let started = Instant::now();
    info!(input = %input.display(), case, "starting analysis");

    let mut model = match load_model(input) {
        Ok(model) => model,
        Err(failure) => {
            error!(code = failure.code(), "{failure}");
            write_json(output, &FailureDocument::from(&failure))?;
            return Err(failure).context("model document rejected");
        }
    };

    let results = match model.analyze(case) {
        Ok(results) => results.clone(),
        Err(failure) => {
            error!(code = failure.code(), "{failure}");
            write_json(output, &FailureDocument::from(&failure))?;
            return Err(failure).with_context(|| format!("analysis of case '{case}' failed"));
        }
    };

    write_json(output, &model.results_document(&results, started.elapsed()))?;
    if let Some(path) = matrices {
        write_json(path, &model.matrices_document(&results))?;
    }

    println!(
        "{}",
        CaseReport::new(&results, units).with_node_labels(model.node_labels())
    );
    info!(elapsed = ?started.elapsed(), "analysis completed");
    Ok(())
}

fn modal(input: &Path, modes: usize, mass_source: &str, output: &Path) -> Result<()> {
    let started = Instant::now();
    info!(input = %input.display(), modes, mass_source, "starting modal analysis");

    let model = match load_model(input) {
        Ok(model) => model,
        Err(failure) => {
            error!(code = failure.code(), "{failure}");
            write_json(output, &FailureDocument::from(&failure))?;
            return Err(failure).context("model document rejected");
        }
    };

    let results = match model.modal(mass_source, modes) {
        Ok(results) => results,
        Err(failure) => {
            error!(code = failure.code(), "{failure}");
            write_json(output, &FailureDocument::from(&failure))?;
            return Err(failure).context("modal analysis failed");
        }
    };

    write_json(
        output,
        &model.modal_document(mass_source, &results, started.elapsed()),
    )?;
    println!("{}", ModalReport::new(&results));
    info!(elapsed = ?started.elapsed(), "modal analysis completed");
    Ok(())
}

fn run_demo(units: UnitSystem) -> Result<()> {
    let properties = PortalProperties::default();
    let (mut frame, geometry) =
        build_portal_frame(&properties).context("building the portal frame")?;
    apply_portal_conditions(&mut frame, &geometry, &properties)
        .context("applying supports and loads")?;
    let summary = run_portal_analysis(&mut frame, &geometry).context("solving the portal frame")?;

    let results = frame
        .results(DEMO_CASE)
        .context("results of the demonstration case")?;
    println!("{}", CaseReport::new(results, units));
    println!(
        "Sway: {:.4} {}, beam end moment: {:.3} {}, total vertical reaction: {:.3} {}",
        units.to_display_length(summary.sway),
        units.length.symbol(),
        units.to_display_moment(summary.beam_end_moment),
        units.moment_label(),
        units.to_display_force(summary.base_reaction.fz),
        units.force.symbol(),
    );
    if !summary.balanced {
        anyhow::bail!("portal frame failed the equilibrium check");
    }
    Ok(())
}

fn features(output: Option<&Path>) -> Result<()> {
    let html = render_features_page(&DefaultShell);
    match output {
        Some(path) => std::fs::write(path, html)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{html}"),
    }
    Ok(())
}
