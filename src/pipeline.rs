//! Per-bundle processing: resolve streamline endpoints, look up overlay scalars,
//! sample attached volumes, and write one delimited report per input bundle.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::resolver::{EndpointMatch, EndpointResolver};
use crate::sampler::{sample_along, SampleStats, VolumeField};
use crate::trk::{Streamline, TrkBundle};

/// Placeholder written for a scalar that could not be measured: an endpoint with no
/// surface match within the search radius, or a volume with zero in-bounds samples.
/// Explicit on purpose, so it can never be mistaken for a real measurement.
pub const PLACEHOLDER: &str = "NA";

/// The transient per-streamline result. Written immediately, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub name: String,
    pub start_curvature: Option<f32>,
    pub last_curvature: Option<f32>,
    pub start_thickness: Option<f32>,
    pub last_thickness: Option<f32>,
    pub volume_stats: Vec<SampleStats>,
}

impl MeasurementRow {
    fn fmt_scalar(value: Option<f32>) -> String {
        match value {
            Some(v) => format!("{}", v),
            None => PLACEHOLDER.to_string(),
        }
    }

    fn fmt_stat(value: f32, empty: bool) -> String {
        if empty {
            PLACEHOLDER.to_string()
        } else {
            format!("{}", value)
        }
    }

    /// Write this row as one comma-delimited report line.
    pub fn write_delimited<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(
            out,
            "{},{},{},{},{}",
            self.name,
            Self::fmt_scalar(self.start_curvature),
            Self::fmt_scalar(self.last_curvature),
            Self::fmt_scalar(self.start_thickness),
            Self::fmt_scalar(self.last_thickness),
        )?;
        for stats in &self.volume_stats {
            write!(
                out,
                ",{},{}",
                Self::fmt_stat(stats.mean, stats.is_empty()),
                Self::fmt_stat(stats.stddev, stats.is_empty()),
            )?;
        }
        writeln!(out)
    }
}

/// Orchestrates one run: iterates bundles in input order, streamlines within a bundle in
/// file order, and emits one CSV report per bundle into the output directory. The surface
/// indices and attached volumes are built once and shared, read-only, across all bundles.
pub struct Pipeline {
    resolver: EndpointResolver,
    volumes: Vec<VolumeField>,
    out_dir: PathBuf,
}

impl Pipeline {
    pub fn new<P: AsRef<Path>>(
        resolver: EndpointResolver,
        volumes: Vec<VolumeField>,
        out_dir: P,
    ) -> Pipeline {
        Pipeline {
            resolver,
            volumes,
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    /// The report path for one input bundle: output directory plus the input file's
    /// basename with the extension replaced by `.csv`.
    pub fn report_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("bundle"));
        self.out_dir.join(format!("{}.csv", stem))
    }

    /// Process all input bundles sequentially. Any unreadable bundle or unopenable
    /// report file is fatal for the whole run.
    pub fn run(&self, inputs: &[PathBuf]) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        for input in inputs {
            let bundle = TrkBundle::from_file(input)?;
            let report = self.report_path(input);
            info!(
                input = %input.display(),
                report = %report.display(),
                num_streamlines = bundle.num_streamlines(),
                "processing bundle"
            );

            let mut out = BufWriter::new(File::create(&report)?);
            self.process_bundle(&bundle, &mut out)?;
            out.flush()?;
        }
        Ok(())
    }

    /// Write the report for one bundle: the fixed header, then one row per streamline
    /// in input order.
    pub fn process_bundle<W: Write>(&self, bundle: &TrkBundle, out: &mut W) -> Result<()> {
        self.write_header(out)?;
        for (idx, streamline) in bundle.streamlines.iter().enumerate() {
            let row = self.measure(streamline, idx + 1);
            row.write_delimited(out)?;
        }
        Ok(())
    }

    /// The header column set is fixed once for the whole run: the four overlay columns,
    /// plus one mean/stde pair per attached volume, in attachment order.
    fn write_header<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(
            out,
            "Streamline Name, Curvature of Start Point, Curvature of Last Point, \
             Thickness of Start Point, Thickness of Last Point"
        )?;
        for volume in &self.volumes {
            write!(out, ", mean{}, stde{}", volume.name, volume.name)?;
        }
        writeln!(out)
    }

    /// Measure one streamline. The first and the last point are resolved independently,
    /// so they may land on different hemispheres; overlay scalars are read from whichever
    /// hemisphere matched. Endpoints with no match on either hemisphere produce
    /// placeholder cells. All endpoint state is local to this call.
    pub fn measure(&self, streamline: &Streamline, counter: usize) -> MeasurementRow {
        let start = streamline
            .first_point()
            .and_then(|p| self.resolver.resolve(p));
        let last = streamline
            .last_point()
            .and_then(|p| self.resolver.resolve(p));

        let volume_stats = self
            .volumes
            .iter()
            .map(|volume| sample_along(streamline, volume))
            .collect();

        MeasurementRow {
            name: format!("StreamLine {}", counter),
            start_curvature: start.map(|m| self.curvature_of(&m)),
            last_curvature: last.map(|m| self.curvature_of(&m)),
            start_thickness: start.map(|m| self.thickness_of(&m)),
            last_thickness: last.map(|m| self.thickness_of(&m)),
            volume_stats,
        }
    }

    fn curvature_of(&self, m: &EndpointMatch) -> f32 {
        self.resolver.index(m.hemisphere).curvature_at(m.vertex)
    }

    fn thickness_of(&self, m: &EndpointMatch) -> f32 {
        self.resolver.index(m.hemisphere).thickness_at(m.vertex)
    }
}
