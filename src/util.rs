//! Utility functions shared by the binary format readers.

use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Check whether the file name ends with ".gz" or ".mgz", i.e., whether the contents need GZip decoding.
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| {
            let name = a.to_string_lossy();
            name.ends_with(".gz") || name.ends_with(".mgz")
        })
        .unwrap_or(false)
}

/// Consume and discard `len` bytes from the input. Needed because GZ streams do not support seeking.
pub fn skip_bytes<S>(input: &mut S, len: usize) -> Result<()>
where
    S: Read,
{
    let mut buf = vec![0u8; len];
    input.read_exact(&mut buf)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gz_detection_covers_gz_and_mgz_suffixes() {
        assert!(is_gz_file("subject1/surf/lh.white.gz"));
        assert!(is_gz_file("subject1/mri/brain.mgz"));
        assert!(!is_gz_file("subject1/surf/lh.white"));
        assert!(!is_gz_file("bundle.trk"));
    }

    #[test]
    fn skip_bytes_advances_the_reader() {
        let data: Vec<u8> = (0u8..10).collect();
        let mut cursor = std::io::Cursor::new(data);
        skip_bytes(&mut cursor, 4).unwrap();
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![4, 5, 6, 7, 8, 9]);
    }
}
