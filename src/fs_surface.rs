// Functions for reading FreeSurfer brain surface meshes from binary 'surf' files.
// These files store a triangular mesh: each vertex is defined by its x,y,z coord and
// each face is defined by 3 indices into the vertices.

use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use nalgebra::Point3;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, TractMeasuresError};
use crate::util::is_gz_file;

pub const TRIS_MAGIC_FILE_TYPE_NUMBER: i32 = 16777214;

#[derive(Debug, Clone, PartialEq)]
pub struct FsSurfaceHeader {
    pub info_line: String,
    pub num_vertices: i32,
    pub num_faces: i32,
}

impl FsSurfaceHeader {
    /// Read an FsSurface header from the given byte stream.
    /// It is assumed that the input is currently at the start of the file.
    /// The reader is left positioned at the start of the vertex data.
    pub fn from_reader<S>(input: &mut S) -> Result<FsSurfaceHeader>
    where
        S: Read,
    {
        let mut input = ByteOrdered::be(input);

        let b1 = input.read_u8()?;
        let b2 = input.read_u8()?;
        let b3 = input.read_u8()?;
        if interpret_fs_int24(b1, b2, b3) != TRIS_MAGIC_FILE_TYPE_NUMBER {
            return Err(TractMeasuresError::InvalidFsSurfaceFormat);
        }

        // The creation info line is terminated by two consecutive '\n' chars.
        let mut info_line = String::new();
        let mut prev_char = ' ';
        loop {
            let cur_char = input.read_u8()? as char;
            if cur_char == '\n' && prev_char == '\n' {
                break;
            }
            info_line.push(cur_char);
            prev_char = cur_char;
        }

        Ok(FsSurfaceHeader {
            info_line: info_line.trim_end().to_string(),
            num_vertices: input.read_i32()?,
            num_faces: input.read_i32()?,
        })
    }
}

/// Interpret three bytes as a single 24 bit integer, FreeSurfer style.
pub fn interpret_fs_int24(b1: u8, b2: u8, b3: u8) -> i32 {
    let c1 = (b1 as u32).checked_shl(16).unwrap_or(0);
    let c2 = (b2 as u32).checked_shl(8).unwrap_or(0);
    let c3 = b3 as i32;

    c1 as i32 + c2 as i32 + c3
}

/// A triangular brain surface mesh read from a FreeSurfer surf file.
#[derive(Debug, Clone, PartialEq)]
pub struct FsSurface {
    pub header: FsSurfaceHeader,
    pub vertices: Vec<Point3<f32>>,
    pub faces: Vec<[i32; 3]>,
}

/// Read a brain mesh from a FreeSurfer surf file like `lh.orig`.
pub fn read_surf<P: AsRef<Path>>(path: P) -> Result<FsSurface> {
    FsSurface::from_file(path)
}

impl FsSurface {
    /// Read an FsSurface instance from a file.
    /// If the file's name ends with ".gz", the file is assumed to need GZip decoding. This is not
    /// typically the case for FreeSurfer surf files, but very handy for keeping test data small.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsSurface> {
        let gz = is_gz_file(&path);
        let mut file = BufReader::new(File::open(path)?);
        if gz {
            FsSurface::from_reader(&mut GzDecoder::new(file))
        } else {
            FsSurface::from_reader(&mut file)
        }
    }

    /// Read an FsSurface instance from the given byte stream, header included.
    pub fn from_reader<S>(input: &mut S) -> Result<FsSurface>
    where
        S: Read,
    {
        let hdr = FsSurfaceHeader::from_reader(input)?;
        let mut input = ByteOrdered::be(input);

        let mut vertices: Vec<Point3<f32>> = Vec::with_capacity(hdr.num_vertices as usize);
        for _ in 0..hdr.num_vertices {
            let x = input.read_f32()?;
            let y = input.read_f32()?;
            let z = input.read_f32()?;
            vertices.push(Point3::new(x, y, z));
        }

        let mut faces: Vec<[i32; 3]> = Vec::with_capacity(hdr.num_faces as usize);
        for _ in 0..hdr.num_faces {
            let v0 = input.read_i32()?;
            let v1 = input.read_i32()?;
            let v2 = input.read_i32()?;
            faces.push([v0, v1, v2]);
        }

        Ok(FsSurface {
            header: hdr,
            vertices,
            faces,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use byteordered::byteorder::{BigEndian, WriteBytesExt};
    use std::io::Cursor;

    /// Serialize a surf file into a byte buffer, the way FreeSurfer writes them.
    pub fn write_surf_bytes(vertices: &[Point3<f32>], faces: &[[i32; 3]]) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(&[0xff, 0xff, 0xfe]);
        buf.extend_from_slice(b"created by tests\n\n");
        buf.write_i32::<BigEndian>(vertices.len() as i32).unwrap();
        buf.write_i32::<BigEndian>(faces.len() as i32).unwrap();
        for v in vertices {
            for c in [v.x, v.y, v.z] {
                buf.write_f32::<BigEndian>(c).unwrap();
            }
        }
        for f in faces {
            for idx in f {
                buf.write_i32::<BigEndian>(*idx).unwrap();
            }
        }
        buf
    }

    #[test]
    fn a_synthetic_surf_file_can_be_read() {
        let vertices = vec![
            Point3::new(0.0_f32, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0_i32, 1, 2]];
        let bytes = write_surf_bytes(&vertices, &faces);

        let surf = FsSurface::from_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(3, surf.header.num_vertices);
        assert_eq!(1, surf.header.num_faces);
        assert_eq!("created by tests", surf.header.info_line);
        assert_eq!(vertices, surf.vertices);
        assert_eq!(faces, surf.faces);
    }

    #[test]
    fn a_wrong_magic_number_is_rejected() {
        let bytes = vec![0x00, 0x01, 0x02, b'\n', b'\n', 0, 0, 0, 0, 0, 0, 0, 0];
        let res = FsSurface::from_reader(&mut Cursor::new(bytes));
        assert!(matches!(
            res,
            Err(TractMeasuresError::InvalidFsSurfaceFormat)
        ));
    }
}
