//! Bit codec between tile subsets and dense integer indices.
//!
//! Bit `i - 1` of an index is set iff tile value `i` is present. Value tables
//! kept by baseline policies and learners are indexed by the same integers,
//! so this ordering must not change.

use crate::error::{Result, SolverError};
use crate::exact::config::MAX_BOARD_SIZE;

fn check_board_size(n: u8) -> Result<()> {
    if n == 0 || n > MAX_BOARD_SIZE {
        return Err(SolverError::InvalidState(format!(
            "board size {} outside 1..={}",
            n, MAX_BOARD_SIZE
        )));
    }
    Ok(())
}

/// Encode a subset of {1..=n} as an index in `[0, 2^n)`.
///
/// # Errors
/// Values outside `[1, n]` and duplicate values are rejected.
pub fn encode(values: &[u8], n: u8) -> Result<u32> {
    check_board_size(n)?;

    let mut index = 0u32;
    for &value in values {
        if value == 0 || value > n {
            return Err(SolverError::InvalidState(format!(
                "tile value {} outside 1..={}",
                value, n
            )));
        }
        let bit = 1u32 << (value - 1);
        if index & bit != 0 {
            return Err(SolverError::InvalidState(format!(
                "duplicate tile value {}",
                value
            )));
        }
        index |= bit;
    }
    Ok(index)
}

/// Decode an index in `[0, 2^n)` into ascending tile values.
///
/// # Errors
/// Indices at or above `2^n` are rejected.
pub fn decode(index: u32, n: u8) -> Result<Vec<u8>> {
    check_board_size(n)?;

    if (index as u64) >= (1u64 << n) {
        return Err(SolverError::InvalidState(format!(
            "index {} out of range for {} tiles",
            index, n
        )));
    }
    Ok((1..=n).filter(|&v| index & (1 << (v - 1)) != 0).collect())
}

/// Positional flag form of an index: flag `k` is tile `k + 1`.
pub fn to_flags(index: u32, n: u8) -> Result<Vec<bool>> {
    let values = decode(index, n)?;
    let mut flags = vec![false; n as usize];
    for v in values {
        flags[(v - 1) as usize] = true;
    }
    Ok(flags)
}

/// Inverse of [`to_flags`].
pub fn from_flags(flags: &[bool]) -> Result<u32> {
    if flags.len() > MAX_BOARD_SIZE as usize {
        return Err(SolverError::InvalidState(format!(
            "{} flags exceed maximum board size {}",
            flags.len(),
            MAX_BOARD_SIZE
        )));
    }
    Ok(flags
        .iter()
        .enumerate()
        .filter(|&(_, &set)| set)
        .fold(0u32, |acc, (k, _)| acc | (1 << k)))
}
