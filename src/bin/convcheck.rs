use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use convmat::{
    config::{parse_filter, parse_padding, Direction, HarnessConfig},
    harness::{oracle::DirectOracle, runner},
    PaddingPolicy,
};

/// Checks the sparse-matrix convolution against a reference convolution over a
/// grid of parameters. Exits non-zero if any case disagrees.
#[derive(Parser, Debug)]
#[command(name = "convcheck")]
struct Cli {
    /// JSON harness config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input lengths to sweep
    #[arg(long = "input-size", short = 's', num_args = 1..)]
    input_sizes: Vec<usize>,

    /// Filters as comma-separated taps, e.g. 1,2,3
    #[arg(long, num_args = 1..)]
    filters: Vec<String>,

    /// Key taps to try; defaults to every tap
    #[arg(long = "keys", num_args = 1..)]
    keys: Vec<usize>,

    #[arg(long, num_args = 1..)]
    strides: Vec<usize>,

    #[arg(long, num_args = 1..)]
    dilations: Vec<usize>,

    /// valid, same, an amount for both sides, or left,right
    #[arg(long, num_args = 1.., value_parser = parse_padding)]
    paddings: Vec<PaddingPolicy>,

    /// Only check the transpose direction
    #[arg(long, conflicts_with = "forward_only")]
    transpose_only: bool,

    /// Only check the forward direction
    #[arg(long)]
    forward_only: bool,

    /// Largest random input value
    #[arg(long = "max-input-val")]
    max_input_value: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    tolerance: Option<f64>,

    /// How many mismatching cases to print
    #[arg(long)]
    max_reported: Option<usize>,

    #[arg(long)]
    workers: Option<usize>,

    /// Print one row per case
    #[arg(long)]
    verbose: bool,
}

fn override_list<T>(target: &mut Vec<T>, values: Vec<T>) {
    if !values.is_empty() {
        *target = values;
    }
}

fn build_config(cli: Cli) -> anyhow::Result<(HarnessConfig, bool)> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    override_list(&mut config.input_lengths, cli.input_sizes);
    let filters = cli.filters.iter()
        .map(|text| parse_filter(text))
        .collect::<Result<Vec<_>, _>>()?;
    override_list(&mut config.filters, filters);
    override_list(&mut config.key_indices, cli.keys);
    override_list(&mut config.strides, cli.strides);
    override_list(&mut config.dilations, cli.dilations);
    override_list(&mut config.paddings, cli.paddings);
    if cli.transpose_only {
        config.directions = vec![Direction::Transpose];
    } else if cli.forward_only {
        config.directions = vec![Direction::Forward];
    }
    config.max_input_value = cli.max_input_value.unwrap_or(config.max_input_value);
    config.seed = cli.seed.unwrap_or(config.seed);
    config.tolerance = cli.tolerance.unwrap_or(config.tolerance);
    config.workers = cli.workers.or(config.workers);
    config.max_reported = cli.max_reported.unwrap_or(config.max_reported);

    config.validate()?;
    Ok((config, cli.verbose))
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, verbose) = build_config(Cli::parse())?;
    let report = runner::run(&config, &DirectOracle);

    if verbose {
        print!("{}", report.render_table(true));
    }
    print!("{}", report.render_summary(config.max_reported, true));

    Ok(if report.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
