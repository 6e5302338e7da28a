//! Functions for reading tractography streamline bundles from TrackVis 'trk' files.
//!
//! A trk file stores polylines ("streamlines"), each an ordered sequence of 3D points.
//! Points are stored in voxel-mm coordinates; for version 2 files carrying a valid
//! `vox_to_ras` matrix they are transformed to physical RAS space on read, so that they
//! live in the same coordinate space as FreeSurfer surface vertices.

use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use nalgebra::{Matrix4, Point3, Vector4};
use tracing::warn;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, TractMeasuresError};
use crate::util::{is_gz_file, skip_bytes};

pub const TRK_MAGIC: &[u8; 5] = b"TRACK";
pub const TRK_HEADER_SIZE: i32 = 1000;

/// Models the fixed-size 1000 byte header of a TrackVis trk file.
/// The scalar/property name tables and display hints are skipped on read.
#[derive(Debug, Clone, PartialEq)]
pub struct TrkHeader {
    pub dim: [i16; 3],
    pub voxel_size: [f32; 3],
    pub origin: [f32; 3],
    pub n_scalars: i16,
    pub n_properties: i16,
    pub vox_to_ras: [[f32; 4]; 4],
    pub n_count: i32,
    pub version: i32,
    pub hdr_size: i32,
}

impl TrkHeader {
    /// Read a trk header from the given byte stream. Trk files are little-endian.
    pub fn from_reader<S>(input: &mut S) -> Result<TrkHeader>
    where
        S: Read,
    {
        let mut input = ByteOrdered::le(input);

        let mut id_string = [0u8; 6];
        input.read_exact(&mut id_string)?;
        if &id_string[0..5] != TRK_MAGIC {
            return Err(TractMeasuresError::InvalidTrkFormat);
        }

        let mut dim = [0i16; 3];
        for v in &mut dim {
            *v = input.read_i16()?;
        }
        let mut voxel_size = [0f32; 3];
        for v in &mut voxel_size {
            *v = input.read_f32()?;
        }
        let mut origin = [0f32; 3];
        for v in &mut origin {
            *v = input.read_f32()?;
        }

        let n_scalars = input.read_i16()?;
        skip_bytes(&mut input, 200)?; // scalar_name[10][20]
        let n_properties = input.read_i16()?;
        skip_bytes(&mut input, 200)?; // property_name[10][20]

        let mut vox_to_ras = [[0f32; 4]; 4];
        for row in &mut vox_to_ras {
            for v in row.iter_mut() {
                *v = input.read_f32()?;
            }
        }

        skip_bytes(&mut input, 444)?; // reserved
        skip_bytes(&mut input, 4)?; // voxel_order
        skip_bytes(&mut input, 4)?; // pad2
        skip_bytes(&mut input, 24)?; // image_orientation_patient
        skip_bytes(&mut input, 2)?; // pad1
        skip_bytes(&mut input, 6)?; // invert/swap display flags

        let n_count = input.read_i32()?;
        let version = input.read_i32()?;
        let hdr_size = input.read_i32()?;

        if hdr_size != TRK_HEADER_SIZE {
            return Err(TractMeasuresError::InvalidTrkFormat);
        }

        Ok(TrkHeader {
            dim,
            voxel_size,
            origin,
            n_scalars,
            n_properties,
            vox_to_ras,
            n_count,
            version,
            hdr_size,
        })
    }

    /// The voxel-mm to RAS transform of this bundle, if the header carries a usable one.
    /// Only version 2 files store the matrix; an all-zero matrix means "not recorded".
    pub fn voxmm_to_ras(&self) -> Option<Matrix4<f32>> {
        if self.version < 2 || self.vox_to_ras[3][3] == 0.0 {
            return None;
        }
        if self.voxel_size.iter().any(|s| *s <= 0.0) {
            return None;
        }

        let mut vox2ras = Matrix4::zeros();
        for (i, row) in self.vox_to_ras.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                vox2ras[(i, j)] = *v;
            }
        }

        // Points are in voxel-mm, so scale down to voxel indices first.
        let scale = Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::new(
            1.0 / self.voxel_size[0],
            1.0 / self.voxel_size[1],
            1.0 / self.voxel_size[2],
        ));
        Some(vox2ras * scale)
    }
}

/// An ordered polyline of physical-space points approximating one fiber tract.
/// Streamlines read from a trk file always have at least one point.
#[derive(Debug, Clone, PartialEq)]
pub struct Streamline {
    pub points: Vec<Point3<f32>>,
}

impl Streamline {
    pub fn first_point(&self) -> Option<&Point3<f32>> {
        self.points.first()
    }

    pub fn last_point(&self) -> Option<&Point3<f32>> {
        self.points.last()
    }
}

/// The streamlines loaded from one trk file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrkBundle {
    pub header: TrkHeader,
    pub streamlines: Vec<Streamline>,
}

/// Read a streamline bundle from a TrackVis trk file.
pub fn read_trk<P: AsRef<Path>>(path: P) -> Result<TrkBundle> {
    TrkBundle::from_file(path)
}

impl TrkBundle {
    /// Read a TrkBundle from a file. A ".gz" suffix triggers GZip decoding.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TrkBundle> {
        let gz = is_gz_file(&path);
        let mut file = BufReader::new(File::open(path)?);
        if gz {
            TrkBundle::from_reader(&mut GzDecoder::new(file))
        } else {
            TrkBundle::from_reader(&mut file)
        }
    }

    /// Read a TrkBundle from the given byte stream, header included.
    pub fn from_reader<S>(input: &mut S) -> Result<TrkBundle>
    where
        S: Read,
    {
        let hdr = TrkHeader::from_reader(input)?;
        let to_ras = hdr.voxmm_to_ras();
        let mut input = ByteOrdered::le(input);

        let mut streamlines: Vec<Streamline> = Vec::new();
        if hdr.n_count > 0 {
            streamlines.reserve(hdr.n_count as usize);
        }

        loop {
            // n_count == 0 means "track count not recorded": read until EOF.
            if hdr.n_count > 0 && streamlines.len() == hdr.n_count as usize {
                break;
            }

            let num_points = match input.read_i32() {
                Ok(n) => n,
                Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof && hdr.n_count <= 0 => {
                    break
                }
                Err(e) => return Err(e.into()),
            };
            if num_points < 0 {
                return Err(TractMeasuresError::InvalidTrkFormat);
            }

            let mut points: Vec<Point3<f32>> = Vec::with_capacity(num_points as usize);
            for _ in 0..num_points {
                let x = input.read_f32()?;
                let y = input.read_f32()?;
                let z = input.read_f32()?;
                let p = match to_ras {
                    Some(m) => {
                        let r = m * Vector4::new(x, y, z, 1.0);
                        Point3::new(r.x, r.y, r.z)
                    }
                    None => Point3::new(x, y, z),
                };
                points.push(p);
                skip_bytes(&mut input, 4 * hdr.n_scalars as usize)?;
            }
            skip_bytes(&mut input, 4 * hdr.n_properties as usize)?;

            if points.is_empty() {
                warn!("skipping zero-point streamline in trk file");
                continue;
            }
            streamlines.push(Streamline { points });
        }

        Ok(TrkBundle {
            header: hdr,
            streamlines,
        })
    }

    pub fn num_streamlines(&self) -> usize {
        self.streamlines.len()
    }
}
