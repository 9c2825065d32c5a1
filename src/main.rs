//! Batch georeferencing CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::warn;

use georef::{run_batch, BatchOptions, Projection, TransformSpec};

#[derive(Parser, Debug)]
#[command(name = "georef", version)]
#[command(about = "Georeference scanned map sheets and their address overlays in batch")]
struct Cli {
    /// Job table listing one row per scanned sheet.
    jobs_csv: PathBuf,

    /// Target CRS as a PROJ.4 definition, e.g. "+proj=utm +zone=31 +datum=WGS84".
    proj4: String,

    /// Transform token; exactly `tps` selects the thin plate spline,
    /// anything else keeps the poly2 default.
    transform: Option<String>,

    /// Read GCP tables with the older pixelX/pixelY column names.
    #[arg(long)]
    legacy_gcp_columns: bool,

    /// Mark a row failed when it runs longer than this many seconds.
    #[arg(long, value_name = "SECONDS")]
    row_timeout: Option<u64>,

    /// Print the summary as JSON instead of a text table.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let projection = Projection::from_proj4(&cli.proj4)?;
    let spec = match cli.transform.as_deref() {
        Some("tps") => TransformSpec::resolve("tps"),
        Some(other) => {
            warn!(token = other, "Unrecognized transform token, using poly2");
            TransformSpec::resolve("poly2")
        }
        None => TransformSpec::resolve("poly2"),
    };
    let options = BatchOptions::default()
        .with_legacy_gcp_format(cli.legacy_gcp_columns)
        .with_row_timeout(cli.row_timeout.map(Duration::from_secs));

    let summary = run_batch(&cli.jobs_csv, &projection, spec, &options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
