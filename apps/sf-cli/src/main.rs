mod driver;
mod error;
mod tracing_setup;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::CliResult;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "SewerFlow CLI - drainage network conveyance routing", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// Route a scenario from start to end and print its continuity summary
    Run {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
        /// Routing step in seconds (overrides the scenario)
        #[arg(long)]
        step: Option<f64>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        /// Write the JSON summary to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    tracing_setup::setup_tracing(cli.debug)?;

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run {
            scenario_path,
            step,
            json,
            output,
        } => cmd_run(&scenario_path, step, json, output.as_deref()),
    }
}

fn cmd_validate(scenario_path: &Path) -> CliResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = sf_project::load(scenario_path)?;
    sf_project::compile(&scenario)?;
    println!("✓ Scenario is valid");
    println!(
        "  {} nodes, {} links, {} subcatchments",
        scenario.nodes.len(),
        scenario.links.len(),
        scenario.subcatchments.len()
    );
    Ok(())
}

fn cmd_run(scenario_path: &Path, step: Option<f64>, json: bool, output: Option<&Path>) -> CliResult<()> {
    let scenario = sf_project::load(scenario_path)?;
    let compiled = sf_project::compile(&scenario)?;
    let summary = driver::run(compiled, step)?;

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &driver::RunSummary) {
    let c = &summary.continuity;
    let f = &c.flow;
    println!("✓ Routed scenario: {}", summary.scenario);
    println!();
    println!("Flow routing continuity (volume)");
    println!("  Dry weather inflow   {:>14.3}", f.dry_weather);
    println!("  Wet weather inflow   {:>14.3}", f.wet_weather);
    println!("  Groundwater inflow   {:>14.3}", f.groundwater);
    println!("  RDII inflow          {:>14.3}", f.rdii);
    println!("  External inflow      {:>14.3}", f.external);
    println!("  External outflow     {:>14.3}", f.outflow);
    println!("  Flooding loss        {:>14.3}", f.flooding);
    println!("  Evaporation loss     {:>14.3}", f.evap_loss);
    println!("  Seepage loss         {:>14.3}", f.seep_loss);
    println!("  Initial storage      {:>14.3}", c.initial_storage);
    println!("  Final storage        {:>14.3}", c.final_storage);
    println!("  Continuity error (%) {:>14.3}", c.flow_error_pct);
    for (p, err) in c.quality_error_pct.iter().enumerate() {
        println!("  Quality error #{p} (%) {:>13.3}", err);
    }

    let s = &summary.stats;
    println!();
    println!("Routing time step summary");
    println!("  Steps                {:>14}", s.steps);
    println!("  Minimum step (s)     {:>14.3}", s.min_step);
    println!("  Average step (s)     {:>14.3}", s.mean_step);
    println!("  Maximum step (s)     {:>14.3}", s.max_step);
    println!("  Steady state (%)     {:>14.2}", s.steady_pct);
    println!("  Mean iterations      {:>14.2}", s.mean_iterations);
}
