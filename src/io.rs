//! Readers for the two input array formats: textual `.psllh` (one decimal
//! per line) and binary `.binpsllh` (raw little-endian doubles, length
//! implied by the file size).

use std::fs;
use std::path::Path;

use crate::error::{ReduceError, Result};

pub fn read_psllh(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;

    let mut values = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = line.parse::<f64>().map_err(|_| ReduceError::ParseValue {
            path: path.display().to_string(),
            line: number + 1,
            value: line.to_string(),
        })?;
        values.push(value);
    }
    Ok(values)
}

pub fn read_binpsllh(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    if bytes.len() % 8 != 0 {
        return Err(ReduceError::TruncatedBinaryFile {
            path: path.display().to_string(),
            trailing: bytes.len() % 8,
        });
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().expect("chunk holds 8 bytes")))
        .collect())
}
