//! quadtrace-bench: CLI tool for pipeline parameter experimentation and diagnostics.
//!
//! Runs the vectorization pipeline on a given image file with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Tuning simplification tolerance against the fitter's error budget
//! - Comparing parallel and sequential runs of the same image
//! - Measuring per-stage durations to identify bottlenecks
//! - Understanding how parameter changes affect region/chain/curve counts
//!
//! Set `RUST_LOG=quadtrace_pipeline=debug` to see per-stage log lines.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin quadtrace-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use quadtrace_export::{SvgLayers, SvgMetadata};
use quadtrace_pipeline::diagnostics::{PipelineDiagnostics, SystemClock};
use quadtrace_pipeline::{FitConfig, PipelineConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Pipeline parameter experimentation and diagnostics for quadtrace.
///
/// Runs the vectorization pipeline on a given image with configurable
/// parameters and prints detailed per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "quadtrace-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// RDP simplification tolerance in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SIMPLIFY_TOLERANCE)]
    simplify_tolerance: f64,

    /// Thin points with a radial-distance pre-pass before RDP.
    #[arg(long)]
    fast: bool,

    /// Maximum boundary segment length before intermediate points are added.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SUBDIVISION_LENGTH, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    subdivision_length: u32,

    /// Summed squared error at which a curve section is accepted.
    #[arg(long, default_value_t = FitConfig::DEFAULT_ACCEPTABLE_ERROR)]
    acceptable_error: f64,

    /// Cap on fitting iterations per curve section.
    #[arg(long, default_value_t = FitConfig::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Run every stage on the calling thread.
    #[arg(long)]
    no_parallel: bool,

    /// Skip the adjacency and point-graph consistency checks.
    #[arg(long)]
    no_validate: bool,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// SVG layers to draw, comma separated.
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [Layer::Regions, Layer::Curves])]
    layers: Vec<Layer>,

    /// Draw every SVG layer. Overrides `--layers`.
    #[arg(long)]
    all_layers: bool,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// SVG layer selection.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Layer {
    /// Homogeneous quadtree leaves filled with their color.
    Regions,
    /// Raw traced boundary chains.
    Chains,
    /// Critical points kept by simplification.
    Simplified,
    /// Fitted cubic curves.
    Curves,
}

/// Collapse the CLI layer flags into [`SvgLayers`].
fn layers_from_cli(cli: &Cli) -> SvgLayers {
    if cli.all_layers {
        return SvgLayers::ALL;
    }
    SvgLayers {
        regions: cli.layers.contains(&Layer::Regions),
        chains: cli.layers.contains(&Layer::Chains),
        simplified: cli.layers.contains(&Layer::Simplified),
        curves: cli.layers.contains(&Layer::Curves),
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        parallel: !cli.no_parallel,
        validate: !cli.no_validate,
        subdivision_length: cli.subdivision_length,
        simplify_tolerance: cli.simplify_tolerance,
        high_quality: !cli.fast,
        fit: FitConfig {
            acceptable_error: cli.acceptable_error,
            max_iterations: cli.max_iterations,
            ..FitConfig::default()
        },
        ..PipelineConfig::default()
    })
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match quadtrace_pipeline::decode::decode_rgba(&image_bytes) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.image_path.display(),
        image_bytes.len(),
        image.width(),
        image.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let layers = layers_from_cli(&cli);
    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match quadtrace_pipeline::diagnostics::process_with_diagnostics(
            image.clone(),
            &config,
            &SystemClock,
        ) {
            Ok((result, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write SVG on the first run only.
                if run == 0
                    && let Some(ref svg_path) = cli.svg
                {
                    let title = cli
                        .image_path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("bench");
                    let desc = format!("{config:#?}");
                    let metadata = SvgMetadata {
                        title: Some(title),
                        description: Some(&desc),
                    };
                    let svg = quadtrace_export::to_svg(&result, &metadata, layers);
                    match std::fs::write(svg_path, &svg) {
                        Ok(()) => {
                            eprintln!(
                                "SVG written to {} ({} bytes)",
                                svg_path.display(),
                                svg.len(),
                            );
                        }
                        Err(e) => {
                            eprintln!("Error writing SVG to {}: {e}", svg_path.display());
                        }
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Quadtree", |d| d.tree.duration),
        ("Adjacency", |d| d.adjacency.duration),
        ("Boundaries", |d| d.boundaries.duration),
        ("Trace", |d| d.trace.duration),
        ("Simplification", |d| d.simplification.duration),
        ("Fit", |d| d.fit.duration),
    ];

    for (name, extractor) in stage_extractors {
        let total: f64 = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum();
        let stage_mean = total / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("quadtrace-bench").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_match_pipeline_config() {
        let cli = parse(&["in.png"]);
        assert_eq!(config_from_cli(&cli).unwrap(), PipelineConfig::default());
        assert_eq!(layers_from_cli(&cli), SvgLayers::default());
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = parse(&[
            "in.png",
            "--no-parallel",
            "--fast",
            "--simplify-tolerance",
            "2.5",
            "--max-iterations",
            "7",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!(!config.parallel);
        assert!(!config.high_quality);
        assert!((config.simplify_tolerance - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.fit.max_iterations, 7);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "in.png",
            "--no-parallel",
            "--config-json",
            r#"{"subdivision_length": 9}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.subdivision_length, 9);
        assert!(config.parallel);
    }

    #[test]
    fn malformed_config_json_is_an_error() {
        let cli = parse(&["in.png", "--config-json", "{"]);
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn layer_list_is_comma_separated() {
        let cli = parse(&["in.png", "--layers", "chains,curves"]);
        let layers = layers_from_cli(&cli);
        assert!(!layers.regions);
        assert!(layers.chains);
        assert!(layers.curves);
        assert_eq!(layers_from_cli(&parse(&["in.png", "--all-layers"])), SvgLayers::ALL);
    }

    #[test]
    fn zero_runs_is_rejected() {
        let result = Cli::try_parse_from(["quadtrace-bench", "in.png", "--runs", "0"]);
        assert!(result.is_err());
    }
}
