//! Little-endian wire encoding for the handshake and reduction payloads.
//!
//! The protocol moves only flat data: a u64 count, a list of tree
//! coordinates, and blocks of f64 partial sums. Framing is fixed-width per
//! element; decode validates lengths and reports the mismatch.

use crate::error::{ReduceError, Result};
use crate::types::TreeCoords;

/// Bytes per encoded coordinate: u64 index + u32 level.
const COORD_SIZE: usize = 12;

pub fn encode_count(count: u64) -> Vec<u8> {
    count.to_le_bytes().to_vec()
}

pub fn decode_count(buf: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = buf
        .try_into()
        .map_err(|_| ReduceError::DecodeFailed(format!("count frame of {} bytes", buf.len())))?;
    Ok(u64::from_le_bytes(bytes))
}

pub fn encode_coords(coords: &[TreeCoords]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(coords.len() * COORD_SIZE);
    for c in coords {
        buf.extend_from_slice(&c.x.to_le_bytes());
        buf.extend_from_slice(&c.y.to_le_bytes());
    }
    buf
}

pub fn decode_coords(buf: &[u8]) -> Result<Vec<TreeCoords>> {
    if buf.len() % COORD_SIZE != 0 {
        return Err(ReduceError::DecodeFailed(format!(
            "coordinate frame of {} bytes is not a multiple of {COORD_SIZE}",
            buf.len()
        )));
    }
    let mut coords = Vec::with_capacity(buf.len() / COORD_SIZE);
    for chunk in buf.chunks_exact(COORD_SIZE) {
        let x = u64::from_le_bytes(chunk[..8].try_into().expect("chunk holds 8 index bytes"));
        let y = u32::from_le_bytes(chunk[8..].try_into().expect("chunk holds 4 level bytes"));
        coords.push(TreeCoords::new(x, y));
    }
    Ok(coords)
}

pub fn encode_values(values: &[f64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 8);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

pub fn decode_values(buf: &[u8]) -> Result<Vec<f64>> {
    if buf.len() % 8 != 0 {
        return Err(ReduceError::DecodeFailed(format!(
            "value frame of {} bytes is not a multiple of 8",
            buf.len()
        )));
    }
    Ok(buf
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().expect("chunk holds 8 value bytes")))
        .collect())
}
