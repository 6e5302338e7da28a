//! Extraction of per-streamline anatomical measurements from tractography bundles.
//!
//! The streamlines of each input bundle are matched against two FreeSurfer hemisphere
//! surfaces: each endpoint is associated with the nearest surface vertex, and per-vertex
//! curvature and thickness overlay values are read at the matched vertex. Optionally,
//! volumetric scalar fields (e.g. diffusion metrics in MGH format) are sampled at every
//! streamline point and aggregated to mean and population standard deviation. One CSV
//! report is written per input bundle.

pub mod error;
pub mod fs_curv;
pub mod fs_mgh;
pub mod fs_surface;
pub mod pipeline;
pub mod resolver;
pub mod sampler;
pub mod surface_index;
pub mod trk;
pub mod util;

pub use error::{Result, TractMeasuresError};
pub use fs_curv::{read_curv, CurvHeader, FsCurv};
pub use fs_mgh::{read_mgh, FsMgh, FsMghHeader};
pub use fs_surface::{read_surf, FsSurface, FsSurfaceHeader};
pub use pipeline::{MeasurementRow, Pipeline, PLACEHOLDER};
pub use resolver::{EndpointMatch, EndpointResolver, Hemisphere, DEFAULT_SEARCH_RADIUS};
pub use sampler::{sample_along, SampleStats, VolumeField};
pub use surface_index::SurfaceIndex;
pub use trk::{read_trk, Streamline, TrkBundle, TrkHeader};
