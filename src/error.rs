use quick_error::quick_error;
use std::io::Error as IOError;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum TractMeasuresError {
        /// Invalid surf file: wrong magic number.
        InvalidFsSurfaceFormat {
            display("Invalid FreeSurfer surf file")
        }

        /// Invalid curv file: wrong magic number.
        InvalidCurvFormat {
            display("Invalid FreeSurfer curv file")
        }

        InvalidFsMghFormat {
            display("Invalid FreeSurfer MGH file")
        }

        /// MGH volume without RAS information cannot be sampled in physical space.
        MissingRasTransform {
            display("MGH volume carries no valid RAS transform")
        }

        InvalidTrkFormat {
            display("Invalid TrackVis trk file")
        }

        /// A per-vertex overlay whose length disagrees with the surface vertex count.
        ShapeMismatch(num_vertices: usize, num_values: usize) {
            display("Overlay has {} values for a surface with {} vertices", num_values, num_vertices)
        }

        EmptySurface {
            display("Surface mesh has no vertices")
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, TractMeasuresError>;
