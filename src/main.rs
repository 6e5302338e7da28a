//! dmri_extract_surface_measurements: per-streamline anatomical measurements.
//!
//! Takes one or more tractography bundles (.trk), a left and right FreeSurfer surface
//! with curvature and thickness overlays, and optionally named MGH/MGZ volumes. Writes
//! one CSV report per bundle into the output directory.
//!
//! Set `RUST_LOG` to control log output, e.g. `RUST_LOG=tractmeasures=debug`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tractmeasures::{EndpointResolver, Pipeline, SurfaceIndex, VolumeField};

/// Extract per-streamline curvature, thickness and volume metrics.
#[derive(Parser, Debug)]
#[command(name = "dmri_extract_surface_measurements", version, about, long_about = None)]
struct Cli {
    /// Input streamline bundles (.trk)
    #[arg(short = 'i', long = "input", num_args = 1.., required = true, value_name = "FILE")]
    input: Vec<PathBuf>,

    /// Left hemisphere surface
    #[arg(long = "sl", default_value = "lh.orig", value_name = "FILE")]
    surf_left: PathBuf,

    /// Right hemisphere surface
    #[arg(long = "sr", default_value = "rh.orig", value_name = "FILE")]
    surf_right: PathBuf,

    /// Left hemisphere thickness overlay
    #[arg(long = "tl", default_value = "lh.thickness", value_name = "FILE")]
    thickness_left: PathBuf,

    /// Right hemisphere thickness overlay
    #[arg(long = "tr", default_value = "rh.thickness", value_name = "FILE")]
    thickness_right: PathBuf,

    /// Left hemisphere curvature overlay
    #[arg(long = "cl", default_value = "lh.curv", value_name = "FILE")]
    curv_left: PathBuf,

    /// Right hemisphere curvature overlay
    #[arg(long = "cr", default_value = "rh.curv", value_name = "FILE")]
    curv_right: PathBuf,

    /// Output directory for the CSV reports
    #[arg(short = 'o', long = "out", default_value = "measures", value_name = "DIR")]
    out: PathBuf,

    /// Attached volumes: a count followed by name/path pairs,
    /// e.g. `--fa 2 FA fa.mgz AD ad.mgz`
    #[arg(long = "fa", num_args = 1.., value_name = "N NAME PATH...")]
    fa: Vec<String>,
}

/// Split the `--fa N name1 path1 ... nameN pathN` argument list into named volume paths,
/// preserving attachment order.
fn parse_volume_args(args: &[String]) -> Result<Vec<(String, PathBuf)>> {
    if args.is_empty() {
        return Ok(Vec::new());
    }
    let count: usize = args[0]
        .parse()
        .with_context(|| format!("--fa expects a volume count first, got '{}'", args[0]))?;
    if args.len() != 1 + 2 * count {
        bail!(
            "--fa {} expects {} name/path arguments, got {}",
            count,
            2 * count,
            args.len() - 1
        );
    }
    let volumes = args[1..]
        .chunks(2)
        .map(|pair| (pair[0].clone(), PathBuf::from(&pair[1])))
        .collect();
    Ok(volumes)
}

fn run(cli: Cli) -> Result<()> {
    info!(surf_left = %cli.surf_left.display(), curv_left = %cli.curv_left.display(),
        thickness_left = %cli.thickness_left.display(), "left hemisphere inputs");
    info!(surf_right = %cli.surf_right.display(), curv_right = %cli.curv_right.display(),
        thickness_right = %cli.thickness_right.display(), "right hemisphere inputs");
    info!(out = %cli.out.display(), num_bundles = cli.input.len(), "run configuration");

    let left = SurfaceIndex::from_files(&cli.surf_left, &cli.curv_left, &cli.thickness_left)
        .context("loading left hemisphere")?;
    let right = SurfaceIndex::from_files(&cli.surf_right, &cli.curv_right, &cli.thickness_right)
        .context("loading right hemisphere")?;
    let resolver = EndpointResolver::new(left, right);

    let mut volumes = Vec::new();
    for (name, path) in parse_volume_args(&cli.fa)? {
        info!(volume = name.as_str(), path = %path.display(), "attaching volume");
        let field = VolumeField::from_file(&name, &path)
            .with_context(|| format!("loading volume '{}' from {}", name, path.display()))?;
        volumes.push(field);
    }

    Pipeline::new(resolver, volumes, cli.out).run(&cli.input)?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Help requests and argument errors both exit with code 1, like the original tool.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
