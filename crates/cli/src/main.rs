//! ndvibio CLI - NDVI and biomass estimation from GeoTIFF bands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ndvibio_algorithms::vegetation::{
    compute_ndvi, summarize, RasterVegetationTransform, DEFAULT_BIOMASS_COEFFICIENT,
};
use ndvibio_core::io::{
    check_distinct_destinations, commit_all, read_geotiff, stage_bytes, stage_geotiff,
    StagedOutput,
};
use ndvibio_core::{GeoTransform, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ndvibio")]
#[command(author, version, about = "NDVI and biomass estimation from satellite bands", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute NDVI and a linear biomass estimate
    Estimate {
        /// Near-infrared band file
        nir: PathBuf,
        /// Red band file
        red: PathBuf,
        /// Output NDVI GeoTIFF
        #[arg(long)]
        ndvi_out: PathBuf,
        /// Output biomass GeoTIFF
        #[arg(long)]
        biomass_out: PathBuf,
        /// Biomass coefficient applied to NDVI (any finite value)
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_BIOMASS_COEFFICIENT,
            allow_negative_numbers = true
        )]
        coefficient: f64,
        /// Band index to read from the NIR file (1-based)
        #[arg(long, default_value = "1")]
        nir_band: usize,
        /// Band index to read from the red file (1-based)
        #[arg(long, default_value = "1")]
        red_band: usize,
        /// Also write the run summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Compute NDVI only
    Ndvi {
        /// Near-infrared band file
        nir: PathBuf,
        /// Red band file
        red: PathBuf,
        /// Output NDVI GeoTIFF
        output: PathBuf,
        /// Band index to read from the NIR file (1-based)
        #[arg(long, default_value = "1")]
        nir_band: usize,
        /// Band index to read from the red file (1-based)
        #[arg(long, default_value = "1")]
        red_band: usize,
    },
    /// Show information about a raster band
    Info {
        /// Input raster file
        input: PathBuf,
        /// Band index (1-based)
        #[arg(short, long, default_value = "1")]
        band: usize,
    },
}

/// Summary written by `estimate --summary`
#[derive(Debug, Serialize)]
struct EstimateSummary<'a> {
    nir: &'a Path,
    red: &'a Path,
    ndvi_output: &'a Path,
    biomass_output: &'a Path,
    coefficient: f64,
    rows: usize,
    cols: usize,
    transform: GeoTransform,
    projection: Option<String>,
    ndvi_mean: f64,
    biomass_mean: f64,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_band(path: &Path, band: usize) -> Result<Raster> {
    let pb = spinner(&format!("Reading {}...", path.display()));
    let raster = read_geotiff(path, Some(band))
        .with_context(|| format!("Failed to read band {} of {}", band, path.display()));
    pb.finish_and_clear();
    let raster = raster?;
    info!("Input {}: {} x {}", path.display(), raster.cols(), raster.rows());
    Ok(raster)
}

/// Every file `estimate` will write, in commit order
fn estimate_destinations<'a>(
    ndvi_out: &'a Path,
    biomass_out: &'a Path,
    summary: Option<&'a Path>,
) -> Vec<&'a Path> {
    let mut paths = vec![ndvi_out, biomass_out];
    paths.extend(summary);
    paths
}

/// Stage every raster and file, then commit them together so a failure
/// leaves existing files untouched.
fn write_results(rasters: &[(&Raster, &Path)], files: &[(&[u8], &Path)]) -> Result<Vec<PathBuf>> {
    let pb = spinner("Writing output...");
    let staged: Result<Vec<StagedOutput>> = rasters
        .iter()
        .map(|(raster, path)| {
            stage_geotiff(raster, path)
                .with_context(|| format!("Failed to write {}", path.display()))
        })
        .chain(files.iter().map(|(contents, path)| {
            stage_bytes(contents, path)
                .with_context(|| format!("Failed to write {}", path.display()))
        }))
        .collect();
    let committed =
        staged.and_then(|staged| commit_all(staged).context("Failed to commit outputs"));
    pb.finish_and_clear();
    committed
}

fn projection_label(raster: &Raster) -> Option<String> {
    raster.projection().map(|p| p.to_string())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Estimate {
            nir,
            red,
            ndvi_out,
            biomass_out,
            coefficient,
            nir_band,
            red_band,
            summary,
        } => {
            check_distinct_destinations(&estimate_destinations(
                &ndvi_out,
                &biomass_out,
                summary.as_deref(),
            ))
            .context("Output paths must be distinct")?;

            let nir_r = read_band(&nir, nir_band)?;
            let red_r = read_band(&red, red_band)?;

            let start = Instant::now();
            let result = RasterVegetationTransform
                .run(&nir_r, &red_r, coefficient)
                .context("Failed to estimate NDVI and biomass")?;
            let elapsed = start.elapsed();

            let report = match &summary {
                Some(_) => {
                    let (rows, cols) = result.ndvi.shape();
                    let report = EstimateSummary {
                        nir: &nir,
                        red: &red,
                        ndvi_output: &ndvi_out,
                        biomass_output: &biomass_out,
                        coefficient,
                        rows,
                        cols,
                        transform: *result.ndvi.transform(),
                        projection: projection_label(&result.ndvi),
                        ndvi_mean: result.ndvi_mean,
                        biomass_mean: result.biomass_mean,
                    };
                    Some(serde_json::to_vec_pretty(&report)?)
                }
                None => None,
            };
            let files: Vec<(&[u8], &Path)> = match (&report, &summary) {
                (Some(json), Some(path)) => vec![(json.as_slice(), path.as_path())],
                _ => Vec::new(),
            };

            write_results(
                &[
                    (&result.ndvi, ndvi_out.as_path()),
                    (&result.biomass, biomass_out.as_path()),
                ],
                &files,
            )?;

            info!("Mean NDVI: {:.4}", result.ndvi_mean);
            info!("Mean Biomass: {:.4}", result.biomass_mean);
            done("NDVI", &ndvi_out, elapsed);
            done("Biomass", &biomass_out, elapsed);
            if let Some(summary_path) = &summary {
                println!("Summary saved to: {}", summary_path.display());
            }
        }

        Commands::Ndvi {
            nir,
            red,
            output,
            nir_band,
            red_band,
        } => {
            let nir_r = read_band(&nir, nir_band)?;
            let red_r = read_band(&red, red_band)?;
            let start = Instant::now();
            let result = compute_ndvi(&nir_r, &red_r).context("Failed to calculate NDVI")?;
            let elapsed = start.elapsed();
            write_results(&[(&result, output.as_path())], &[])?;
            info!("Mean NDVI: {:.4}", summarize(&result));
            done("NDVI", &output, elapsed);
        }

        Commands::Info { input, band } => {
            let raster = read_band(&input, band)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Band: {}", band);
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            match projection_label(&raster) {
                Some(label) => println!("Projection: {}", label),
                None => println!("Projection: none"),
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate_args(args: &[&str]) -> (PathBuf, PathBuf, Option<PathBuf>) {
        let mut argv = vec!["ndvibio", "estimate", "nir.tif", "red.tif"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Estimate {
                ndvi_out,
                biomass_out,
                summary,
                ..
            } => (ndvi_out, biomass_out, summary),
            _ => panic!("expected the estimate command"),
        }
    }

    #[test]
    fn test_same_output_for_both_rasters_is_rejected() {
        let (ndvi, biomass, summary) =
            estimate_args(&["--ndvi-out", "out.tif", "--biomass-out", "./out.tif"]);
        let paths = estimate_destinations(&ndvi, &biomass, summary.as_deref());
        assert!(check_distinct_destinations(&paths).is_err());
    }

    #[test]
    fn test_summary_may_not_replace_a_raster() {
        let (ndvi, biomass, summary) = estimate_args(&[
            "--ndvi-out",
            "ndvi.tif",
            "--biomass-out",
            "biomass.tif",
            "--summary",
            "biomass.tif",
        ]);
        let paths = estimate_destinations(&ndvi, &biomass, summary.as_deref());
        assert_eq!(paths.len(), 3);
        assert!(check_distinct_destinations(&paths).is_err());
    }

    #[test]
    fn test_distinct_outputs_are_accepted() {
        let (ndvi, biomass, summary) = estimate_args(&[
            "--ndvi-out",
            "ndvi.tif",
            "--biomass-out",
            "biomass.tif",
            "--summary",
            "run.json",
        ]);
        let paths = estimate_destinations(&ndvi, &biomass, summary.as_deref());
        assert!(check_distinct_destinations(&paths).is_ok());
    }
}
