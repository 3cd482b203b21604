// Connectome matrix import
// streamline counts between anatomical regions stored as a comma-delimited text matrix

use crate::error::{FilterError, Result};
use csv::{ReaderBuilder, Trim};
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// read a comma-delimited connectome matrix. Blank lines and lines starting with '#' are skipped.
/// The matrix must be square.
pub fn read_connectome(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| FilterError::io(path, e))?;
    parse_connectome(f, path)
}

/// parse a connectome matrix from any reader. `origin` is only used for error messages.
pub fn parse_connectome<R: Read>(reader: R, origin: &Path) -> Result<Array2<f64>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let mut values = Vec::<f64>::new();
    let mut n_rows = 0;
    let mut n_cols = 0;
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|source| FilterError::ConnectomeCsv {
            path: origin.to_path_buf(),
            source,
        })?;
        n_cols = record.len();
        for (col, field) in record.iter().enumerate() {
            let v = field.parse::<f64>().map_err(|_| FilterError::ConnectomeValue {
                path: origin.to_path_buf(),
                row,
                col,
                value: field.to_string(),
            })?;
            values.push(v);
        }
        n_rows += 1;
    }

    if n_rows != n_cols {
        return Err(FilterError::NotSquare {
            rows: n_rows,
            cols: n_cols,
        });
    }

    // records are read row by row, so the buffer is in standard (row-major) layout
    Array2::from_shape_vec((n_rows, n_cols), values).map_err(|_| FilterError::NotSquare {
        rows: n_rows,
        cols: n_cols,
    })
}
