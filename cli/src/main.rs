//! gpu-tycoon — headless runner for the datacenter simulation.
//!
//! # Usage
//!
//! ```text
//! gpu-tycoon run --seconds 3600 --dt 0.1 --buy L4 --reinvest L4
//! gpu-tycoon catalog > catalog.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use gpu_tycoon_core::{Catalog, GpuModel, Simulation, SimulationConfig};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gpu-tycoon", about = "GPU datacenter simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulation without a UI and report the final state.
    Run(RunArgs),

    /// Print the standard catalog as JSON.
    Catalog,
}

fn parse_model(s: &str) -> Result<GpuModel, String> {
    GpuModel::ALL
        .into_iter()
        .find(|m| m.to_string().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown GPU model '{s}' (expected L4, A100, H100 or GB200)"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Catalog => {
            println!("{}", serde_json::to_string_pretty(&Catalog::standard())?);
            Ok(())
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Simulated seconds to run.
    #[arg(long, default_value = "600")]
    seconds: f64,

    /// Seconds per tick.
    #[arg(long, default_value = "0.1")]
    dt: f64,

    /// Simulation config JSON (missing fields take defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog JSON replacing the standard tables.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Override the config's RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Accelerators to buy before the first tick (repeatable).
    #[arg(long = "buy", value_parser = parse_model)]
    buy: Vec<GpuModel>,

    /// Keep buying this model whenever cash allows.
    #[arg(long, value_parser = parse_model)]
    reinvest: Option<GpuModel>,

    /// Print the final snapshot as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    if !(args.dt > 0.0) || !args.dt.is_finite() {
        bail!("--dt must be a positive number");
    }
    if !(args.seconds >= 0.0) || !args.seconds.is_finite() {
        bail!("--seconds must be a non-negative number");
    }

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimulationConfig::from_json(&text)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }

    let catalog = match &args.catalog {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            Catalog::from_json(&text)?
        }
        None => Catalog::standard(),
    };

    let mut sim = Simulation::new(config, Arc::new(catalog))?;
    info!(seed = sim.config().rng_seed, "simulation created");

    for model in &args.buy {
        sim.purchase_accelerator(*model)
            .with_context(|| format!("buying {model}"))?;
    }

    let ticks = (args.seconds / args.dt).round() as u64;
    for _ in 0..ticks {
        let result = sim.tick(args.dt)?;
        if let Some(victory) = result.victory {
            info!(%victory, time = result.time, "victory");
        }
        if let Some(model) = args.reinvest {
            while sim.purchase_accelerator(model).is_ok() {}
        }
    }

    let violations = sim.state().invariant_violations();
    for violation in &violations {
        warn!(%violation, "state invariant broken");
    }
    if !violations.is_empty() {
        bail!("simulation state is inconsistent");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sim.snapshot())?);
    } else {
        let snapshot = sim.snapshot();
        println!("time            {:>12.1}s", snapshot.time);
        println!("cash            {:>12.2}", snapshot.cash);
        println!("total revenue   {:>12.2}", snapshot.total_revenue);
        println!("power cost      {:>12.2}", snapshot.total_power_cost);
        println!("accelerators    {:>12}", snapshot.capacity.total);
        println!("jobs completed  {:>12}", snapshot.stats.jobs_completed);
        println!("sla compliance  {:>11.1}%", snapshot.stats.sla_compliance);
        println!("queue           {:>12}", snapshot.pending_jobs.len());
        println!("running         {:>12}", snapshot.active_jobs.len());
        println!("achievements    {:>12}", snapshot.achievements.len());
        println!("digest          {}", sim.state_digest()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags_parse_into_args() {
        let cli = Cli::try_parse_from([
            "gpu-tycoon", "run", "--seconds", "30", "--buy", "l4", "--buy", "A100", "--json",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected the run subcommand");
        };
        assert_eq!(args.seconds, 30.0);
        assert_eq!(args.dt, 0.1);
        assert_eq!(args.buy, vec![GpuModel::L4, GpuModel::A100]);
        assert!(args.reinvest.is_none());
        assert!(args.json);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!(Cli::try_parse_from(["gpu-tycoon", "run", "--reinvest", "V100"]).is_err());
    }
}
