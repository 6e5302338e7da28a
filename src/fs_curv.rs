// Functions for reading FreeSurfer per-vertex data from binary 'curv' files.
// These files store 1 scalar value (typically a morphological descriptor, like cortical
// thickness at that point) for each vertex of the respective brain surface mesh.

use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, TractMeasuresError};
use crate::util::is_gz_file;

pub const CURV_MAGIC_FILE_TYPE_NUMBER: i32 = 16777215;

#[derive(Debug, Clone, PartialEq)]
pub struct CurvHeader {
    pub curv_magic: [u8; 3],
    pub num_vertices: i32,
    pub num_faces: i32,
    pub num_values_per_vertex: i32,
}

impl Default for CurvHeader {
    fn default() -> CurvHeader {
        CurvHeader {
            curv_magic: [255; 3],
            num_vertices: 0,
            num_faces: 0,
            num_values_per_vertex: 1,
        }
    }
}

impl CurvHeader {
    /// Read a Curv header from a file.
    /// If the file's name ends with ".gz", the file is assumed to need GZip decoding. This is not
    /// typically the case for FreeSurfer curv files, but very handy for keeping test data small.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CurvHeader> {
        let gz = is_gz_file(&path);
        let mut file = BufReader::new(File::open(path)?);
        if gz {
            CurvHeader::from_reader(&mut GzDecoder::new(file))
        } else {
            CurvHeader::from_reader(&mut file)
        }
    }

    /// Read a Curv header from the given byte stream.
    /// It is assumed that the input is currently at the start of the Curv header.
    pub fn from_reader<S>(input: &mut S) -> Result<CurvHeader>
    where
        S: Read,
    {
        let mut hdr = CurvHeader::default();

        let mut input = ByteOrdered::be(input);

        for v in &mut hdr.curv_magic {
            *v = input.read_u8()?;
        }

        let magic = crate::fs_surface::interpret_fs_int24(
            hdr.curv_magic[0],
            hdr.curv_magic[1],
            hdr.curv_magic[2],
        );
        if magic != CURV_MAGIC_FILE_TYPE_NUMBER {
            return Err(TractMeasuresError::InvalidCurvFormat);
        }

        hdr.num_vertices = input.read_i32()?;
        hdr.num_faces = input.read_i32()?;
        hdr.num_values_per_vertex = input.read_i32()?;

        if hdr.num_values_per_vertex != 1 {
            return Err(TractMeasuresError::InvalidCurvFormat);
        }

        Ok(hdr)
    }
}

/// A per-vertex scalar overlay read from a FreeSurfer curv file, like `lh.curv` or `lh.thickness`.
/// The `data` field holds one value per vertex of the respective surface, in vertex order.
#[derive(Debug, Clone, PartialEq)]
pub struct FsCurv {
    pub header: CurvHeader,
    pub data: Vec<f32>,
}

/// Read a per-vertex scalar overlay from a FreeSurfer curv file.
pub fn read_curv<P: AsRef<Path>>(path: P) -> Result<FsCurv> {
    FsCurv::from_file(path)
}

impl FsCurv {
    /// Read an FsCurv instance from a file, GZip-transparent like [`CurvHeader::from_file`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsCurv> {
        let gz = is_gz_file(&path);
        let mut file = BufReader::new(File::open(path)?);
        if gz {
            FsCurv::from_reader(&mut GzDecoder::new(file))
        } else {
            FsCurv::from_reader(&mut file)
        }
    }

    /// Read an FsCurv instance from the given byte stream, header included.
    pub fn from_reader<S>(input: &mut S) -> Result<FsCurv>
    where
        S: Read,
    {
        let hdr = CurvHeader::from_reader(input)?;
        let mut input = ByteOrdered::be(input);

        let mut data: Vec<f32> = Vec::with_capacity(hdr.num_vertices as usize);
        for _ in 0..hdr.num_vertices {
            data.push(input.read_f32()?);
        }

        Ok(FsCurv { header: hdr, data })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use byteordered::byteorder::{BigEndian, WriteBytesExt};
    use std::io::Cursor;

    /// Serialize a new-format curv file into a byte buffer.
    pub fn write_curv_bytes(data: &[f32]) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(&[0xff, 0xff, 0xff]);
        buf.write_i32::<BigEndian>(data.len() as i32).unwrap();
        buf.write_i32::<BigEndian>(0).unwrap();
        buf.write_i32::<BigEndian>(1).unwrap();
        for v in data {
            buf.write_f32::<BigEndian>(*v).unwrap();
        }
        buf
    }

    #[test]
    fn a_synthetic_curv_file_can_be_read() {
        let values = vec![0.5_f32, -0.25, 2.5, 0.0];
        let bytes = write_curv_bytes(&values);

        let curv = FsCurv::from_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(4, curv.header.num_vertices);
        assert_eq!(1, curv.header.num_values_per_vertex);
        assert_eq!(values, curv.data);
    }

    #[test]
    fn an_old_format_magic_is_rejected() {
        // Old-format curv files start with the vertex count instead of the 3-byte magic.
        let mut buf: Vec<u8> = Vec::new();
        buf.write_i32::<BigEndian>(100).unwrap();
        buf.write_i32::<BigEndian>(0).unwrap();
        buf.write_i32::<BigEndian>(1).unwrap();

        let res = FsCurv::from_reader(&mut Cursor::new(buf));
        assert!(matches!(res, Err(TractMeasuresError::InvalidCurvFormat)));
    }
}
