// Streamline coefficient files
// the bridge exports coefficients as raw little-endian f64. Plain text with one value per line
// (or any whitespace) is accepted as well for vectors produced by other tools.

use crate::error::{FilterError, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// extension of raw little-endian f64 coefficient files
pub const RAW_EXTENSION: &str = "f64";

pub fn read_coefficients(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| FilterError::io(path, e))?;

    if path.extension().is_some_and(|e| e == RAW_EXTENSION) {
        decode_raw(&bytes).map_err(|reason| FilterError::Coefficients {
            path: path.to_path_buf(),
            reason,
        })
    } else {
        decode_text(&bytes).map_err(|reason| FilterError::Coefficients {
            path: path.to_path_buf(),
            reason,
        })
    }
}

fn decode_raw(bytes: &[u8]) -> std::result::Result<Vec<f64>, String> {
    if bytes.len() % size_of::<f64>() != 0 {
        return Err(format!("{} bytes is not a whole number of f64 values", bytes.len()));
    }
    let mut x = vec![0f64; bytes.len() / size_of::<f64>()];
    LittleEndian::read_f64_into(bytes, &mut x);
    Ok(x)
}

fn decode_text(bytes: &[u8]) -> std::result::Result<Vec<f64>, String> {
    let s = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
    s.split_ascii_whitespace()
        .map(|tok| tok.parse::<f64>().map_err(|_| format!("cannot parse {:?} as a number", tok)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::{BufWriter, Write};

    fn write_raw_coefficients(path: &Path, x: &[f64]) {
        let mut w = BufWriter::new(File::create(path).unwrap());
        for &v in x {
            w.write_f64::<LittleEndian>(v).unwrap();
        }
        w.flush().unwrap();
    }

    #[test]
    fn raw_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.f64");
        write_raw_coefficients(&path, &[0.5, -1.25, 3e-9]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 24);
        assert_eq!(read_coefficients(&path).unwrap(), vec![0.5, -1.25, 3e-9]);
    }

    #[test]
    fn truncated_raw_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.f64");
        std::fs::write(&path, [0u8; 12]).unwrap();
        let err = read_coefficients(&path).unwrap_err();
        assert!(matches!(err, FilterError::Coefficients { .. }));
    }

    #[test]
    fn text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "1.0\n2.5e-1\n\n0\n").unwrap();
        assert_eq!(read_coefficients(&path).unwrap(), vec![1.0, 0.25, 0.0]);
    }

    #[test]
    fn text_file_with_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "1.0\nabc\n").unwrap();
        let err = read_coefficients(&path).unwrap_err();
        assert!(err.to_string().contains("abc"));
    }
}
