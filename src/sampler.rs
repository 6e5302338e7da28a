//! Along-streamline sampling of volumetric scalar fields and aggregate statistics.

use nalgebra::{Matrix4, Point3, Vector4};
use ndarray::Array1;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TractMeasuresError};
use crate::fs_mgh::FsMgh;
use crate::trk::Streamline;

/// A named volumetric scalar field with a physical-to-voxel transform, e.g. a
/// diffusion metric map like FA. Read-only once attached.
pub struct VolumeField {
    pub name: String,
    volume: FsMgh,
    ras2vox: Matrix4<f32>,
}

impl VolumeField {
    /// Attach a loaded MGH volume under the given report name. Fails with
    /// `MissingRasTransform` if the volume header carries no usable RAS geometry,
    /// since such a volume cannot be sampled at physical-space streamline points.
    pub fn new<N: Into<String>>(name: N, volume: FsMgh) -> Result<VolumeField> {
        let ras2vox = volume
            .header
            .ras2vox()
            .ok_or(TractMeasuresError::MissingRasTransform)?;
        Ok(VolumeField {
            name: name.into(),
            volume,
            ras2vox,
        })
    }

    /// Load an MGH/MGZ file and attach it under the given report name.
    pub fn from_file<N: Into<String>, P: AsRef<Path>>(name: N, path: P) -> Result<VolumeField> {
        let volume = FsMgh::from_file(path)?;
        VolumeField::new(name, volume)
    }

    /// Sample the field at one physical-space point: transform to voxel space, round to
    /// the nearest voxel index, and look the value up. `None` if the point falls outside
    /// the volume extent.
    pub fn sample_at(&self, point: &Point3<f32>) -> Option<f32> {
        let v = self.ras2vox * Vector4::new(point.x, point.y, point.z, 1.0);
        let x = v.x.round();
        let y = v.y.round();
        let z = v.z.round();
        if x < 0.0 || y < 0.0 || z < 0.0 {
            return None;
        }
        self.volume.value_at(x as usize, y as usize, z as usize)
    }
}

/// Aggregate statistics of one volume sampled along one streamline. `count` is the
/// number of points that fell inside the volume; with a count of zero both `mean`
/// and `stddev` are NaN, the empty-sample sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub mean: f32,
    pub stddev: f32,
    pub count: usize,
}

impl SampleStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Sample `field` at every point of `streamline` and aggregate. Points whose transform
/// lands outside the volume bounds are excluded from the aggregate, not zero-filled.
/// The standard deviation is the population standard deviation (denominator = count).
pub fn sample_along(streamline: &Streamline, field: &VolumeField) -> SampleStats {
    let mut values: Vec<f32> = Vec::with_capacity(streamline.points.len());
    for point in &streamline.points {
        if let Some(v) = field.sample_at(point) {
            values.push(v);
        }
    }

    if values.is_empty() {
        debug!(
            volume = field.name.as_str(),
            "no streamline point inside volume bounds"
        );
        return SampleStats {
            mean: f32::NAN,
            stddev: f32::NAN,
            count: 0,
        };
    }

    let count = values.len();
    let samples = Array1::from(values);
    SampleStats {
        mean: samples.mean().unwrap_or(f32::NAN),
        stddev: samples.std(0.0),
        count,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fs_mgh::FsMghHeader;
    use approx::assert_abs_diff_eq;
    use ndarray::Array4;

    /// A dim^3 volume with identity vox2ras and value = x + 10*y + 100*z.
    fn graded_volume(dim: usize) -> FsMgh {
        let mut header = FsMghHeader::default();
        header.dim1len = dim as i32;
        header.dim2len = dim as i32;
        header.dim3len = dim as i32;
        header.dim4len = 1;
        header.is_ras_good = 1;
        header.delta = [1.0; 3];
        header.mdc_raw = [1., 0., 0., 0., 1., 0., 0., 0., 1.];
        header.p_xyz_c = [dim as f32 / 2.0; 3];

        let data = Array4::from_shape_fn((dim, dim, dim, 1), |(x, y, z, _)| {
            (x + 10 * y + 100 * z) as f32
        });
        FsMgh { header, data }
    }

    fn field(dim: usize) -> VolumeField {
        VolumeField::new("FA", graded_volume(dim)).unwrap()
    }

    #[test]
    fn in_bounds_points_yield_mean_and_population_stddev() {
        let field = field(4);
        let streamline = Streamline {
            points: vec![
                Point3::new(0.0, 0.0, 1.0), // value 100
                Point3::new(1.0, 0.0, 1.0), // value 101
                Point3::new(2.0, 1.0, 0.0), // value 12
            ],
        };
        let stats = sample_along(&streamline, &field);
        assert_eq!(3, stats.count);
        assert_abs_diff_eq!(stats.mean, 71.0, epsilon = 1e-6);
        // Population stddev: sqrt(((29)^2 + (30)^2 + (59)^2) / 3)
        let expected = ((29.0_f32.powi(2) + 30.0_f32.powi(2) + 59.0_f32.powi(2)) / 3.0).sqrt();
        assert_abs_diff_eq!(stats.stddev, expected, epsilon = 1e-5);
    }

    #[test]
    fn out_of_bounds_points_are_excluded_from_the_aggregate() {
        let field = field(4);
        let streamline = Streamline {
            points: vec![
                Point3::new(1.0, 1.0, 1.0),    // value 111
                Point3::new(-50.0, 0.0, 0.0),  // outside
                Point3::new(0.0, 200.0, 0.0),  // outside
                Point3::new(3.0, 1.0, 1.0),    // value 113
            ],
        };
        let stats = sample_along(&streamline, &field);
        assert_eq!(2, stats.count);
        assert_abs_diff_eq!(stats.mean, 112.0, epsilon = 1e-6);
        assert_abs_diff_eq!(stats.stddev, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn a_fully_out_of_bounds_streamline_yields_the_empty_sentinel() {
        let field = field(2);
        let streamline = Streamline {
            points: vec![Point3::new(500.0, 500.0, 500.0)],
        };
        let stats = sample_along(&streamline, &field);
        assert!(stats.is_empty());
        assert!(stats.mean.is_nan());
        assert!(stats.stddev.is_nan());
    }

    #[test]
    fn a_volume_without_ras_geometry_cannot_be_attached() {
        let mut volume = graded_volume(2);
        volume.header.is_ras_good = 0;
        let res = VolumeField::new("FA", volume);
        assert!(matches!(
            res,
            Err(TractMeasuresError::MissingRasTransform)
        ));
    }
}
