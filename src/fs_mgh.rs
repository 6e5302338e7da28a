//! Functions for reading FreeSurfer brain volumes from binary 'MGH'/'MGZ' files.

use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use nalgebra::{Matrix3, Matrix4, Vector3};
use ndarray::{Array, Array4};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, TractMeasuresError};
use crate::util::{is_gz_file, skip_bytes};

pub const MGH_VERSION: i32 = 1;

pub const MGH_DTYPE_MRI_UCHAR: i32 = 0;
pub const MGH_DTYPE_MRI_INT: i32 = 1;
pub const MGH_DTYPE_MRI_FLOAT: i32 = 3;
pub const MGH_DTYPE_MRI_SHORT: i32 = 4;

/// The index in bytes where the data part starts in an MGH file.
pub const MGH_DATA_START: usize = 284;

/// Models the header of a FreeSurfer MGH file containing a brain volume.
#[derive(Debug, Clone, PartialEq)]
pub struct FsMghHeader {
    pub mgh_format_version: i32,
    pub dim1len: i32,
    pub dim2len: i32,
    pub dim3len: i32,
    pub dim4len: i32, // aka "num_frames"
    pub dtype: i32,
    pub dof: i32,
    pub is_ras_good: i16,
    pub delta: [f32; 3],
    pub mdc_raw: [f32; 9],
    pub p_xyz_c: [f32; 3],
}

impl Default for FsMghHeader {
    fn default() -> FsMghHeader {
        FsMghHeader {
            mgh_format_version: MGH_VERSION,
            dim1len: 0,
            dim2len: 0,
            dim3len: 0,
            dim4len: 0,
            dtype: MGH_DTYPE_MRI_FLOAT,
            dof: 0,
            is_ras_good: 0,
            delta: [0.; 3],
            mdc_raw: [0.; 9],
            p_xyz_c: [0.; 3],
        }
    }
}

impl FsMghHeader {
    /// Read an MGH header from the given byte stream.
    /// It is assumed that the input is currently at the start of the header. Afterwards
    /// the reader is positioned at the end of the header fields, NOT at the data start.
    pub fn from_reader<S>(input: &mut S) -> Result<FsMghHeader>
    where
        S: Read,
    {
        let mut hdr = FsMghHeader::default();

        let mut input = ByteOrdered::be(input);

        hdr.mgh_format_version = input.read_i32()?;

        if hdr.mgh_format_version != MGH_VERSION {
            return Err(TractMeasuresError::InvalidFsMghFormat);
        }

        hdr.dim1len = input.read_i32()?;
        hdr.dim2len = input.read_i32()?;
        hdr.dim3len = input.read_i32()?;
        hdr.dim4len = input.read_i32()?;

        hdr.dtype = input.read_i32()?;
        hdr.dof = input.read_i32()?;

        hdr.is_ras_good = input.read_i16()?;

        if hdr.is_ras_good == 1 {
            for idx in 0..3 {
                hdr.delta[idx] = input.read_f32()?;
            }
            for idx in 0..9 {
                hdr.mdc_raw[idx] = input.read_f32()?;
            }
            for idx in 0..3 {
                hdr.p_xyz_c[idx] = input.read_f32()?;
            }
        }
        Ok(hdr)
    }

    /// Number of header bytes consumed by [`FsMghHeader::from_reader`].
    fn len_in_bytes(&self) -> usize {
        let fixed = 4 * 7 + 2;
        if self.is_ras_good == 1 {
            fixed + 4 * (3 + 9 + 3)
        } else {
            fixed
        }
    }

    /// Compute the voxel-index to RAS (physical space) affine from the header geometry,
    /// or `None` if the header carries no valid RAS information.
    ///
    /// FreeSurfer places the RAS origin `p_xyz_c` at the center voxel of the volume:
    /// `xyz = Mdc * diag(delta) * (crs - crs_center) + p_xyz_c`.
    pub fn vox2ras(&self) -> Option<Matrix4<f32>> {
        if self.is_ras_good != 1 {
            return None;
        }

        // mdc_raw holds the direction cosines column-wise: x axis, y axis, z axis.
        let mdc = Matrix3::from_column_slice(&self.mdc_raw);
        let scaled = mdc * Matrix3::from_diagonal(&Vector3::new(
            self.delta[0],
            self.delta[1],
            self.delta[2],
        ));

        let crs_center = Vector3::new(
            self.dim1len as f32 / 2.0,
            self.dim2len as f32 / 2.0,
            self.dim3len as f32 / 2.0,
        );
        let p_c = Vector3::new(self.p_xyz_c[0], self.p_xyz_c[1], self.p_xyz_c[2]);
        let translation = p_c - scaled * crs_center;

        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&scaled);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Some(m)
    }

    /// The RAS to voxel-index affine, inverse of [`FsMghHeader::vox2ras`].
    pub fn ras2vox(&self) -> Option<Matrix4<f32>> {
        self.vox2ras().and_then(|m| m.try_inverse())
    }
}

/// Models a FreeSurfer MGH brain volume. All supported voxel data types
/// (MRI_UCHAR, MRI_INT, MRI_FLOAT, MRI_SHORT) are widened to `f32` on read.
/// The data axes are `[x, y, z, frame]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FsMgh {
    pub header: FsMghHeader,
    pub data: Array4<f32>,
}

impl FsMgh {
    /// Read an MGH or MGZ file. Whether the contents are GZip compressed is decided
    /// by the file name: both `.mgz` and `.mgh.gz` are treated as compressed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsMgh> {
        let gz = is_gz_file(&path);
        let mut file = BufReader::new(File::open(path)?);
        if gz {
            FsMgh::from_reader(&mut GzDecoder::new(file))
        } else {
            FsMgh::from_reader(&mut file)
        }
    }

    /// Read an MGH volume, header and voxel data, from the given byte stream.
    pub fn from_reader<S>(input: &mut S) -> Result<FsMgh>
    where
        S: Read,
    {
        let hdr = FsMghHeader::from_reader(input)?;

        // The voxel data starts at a fixed byte offset, the space in between is unused.
        skip_bytes(input, MGH_DATA_START - hdr.len_in_bytes())?;

        let num_values = (hdr.dim1len as usize)
            * (hdr.dim2len as usize)
            * (hdr.dim3len as usize)
            * (hdr.dim4len as usize);

        let mut input = ByteOrdered::be(input);
        let mut raw: Vec<f32> = Vec::with_capacity(num_values);
        match hdr.dtype {
            MGH_DTYPE_MRI_UCHAR => {
                for _ in 0..num_values {
                    raw.push(input.read_u8()? as f32);
                }
            }
            MGH_DTYPE_MRI_INT => {
                for _ in 0..num_values {
                    raw.push(input.read_i32()? as f32);
                }
            }
            MGH_DTYPE_MRI_FLOAT => {
                for _ in 0..num_values {
                    raw.push(input.read_f32()?);
                }
            }
            MGH_DTYPE_MRI_SHORT => {
                for _ in 0..num_values {
                    raw.push(input.read_i16()? as f32);
                }
            }
            _ => return Err(TractMeasuresError::InvalidFsMghFormat),
        }

        // In the file the first dimension varies fastest, so read as [t,z,y,x]
        // and flip the axes to get the natural [x,y,z,t] indexing.
        let data = Array::from_shape_vec(
            (
                hdr.dim4len as usize,
                hdr.dim3len as usize,
                hdr.dim2len as usize,
                hdr.dim1len as usize,
            ),
            raw,
        )
        .map_err(|_| TractMeasuresError::InvalidFsMghFormat)?
        .permuted_axes([3, 2, 1, 0]);

        Ok(FsMgh { header: hdr, data })
    }

    /// The voxel value of frame 0 at the given voxel index, or `None` if out of bounds.
    pub fn value_at(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        self.data.get([x, y, z, 0]).copied()
    }
}

/// Read an MGH or MGZ file.
pub fn read_mgh<P: AsRef<Path>>(path: P) -> Result<FsMgh> {
    FsMgh::from_file(path)
}
