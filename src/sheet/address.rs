//! `A1`-style cell references.
//!
//! Rows and columns are 0-based everywhere in this crate; only the textual form is 1-based.

use crate::error::{MappingError, MappingResult};

/// Column letters for a 0-based column (`0 -> "A"`, `26 -> "AA"`).
pub fn column_letters(column: u32) -> String {
    let mut n = column + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 0-based column for upper-case column letters.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    letters.bytes().try_fold(0u32, |acc, b| {
        acc.checked_mul(26)?.checked_add(u32::from(b - b'A') + 1)
    })
    .map(|n| n - 1)
}

/// `A1` reference for a 0-based row and column.
pub fn cell_address(row: u32, column: u32) -> String {
    format!("{}{}", column_letters(column), row + 1)
}

/// Splits an `A1` reference into its 0-based row and column.
pub fn parse_address(address: &str) -> MappingResult<(u32, u32)> {
    let invalid = || MappingError::InvalidAddress {
        address: address.to_string(),
    };
    let split = address
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (letters, digits) = address.split_at(split);
    if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let column = column_index(letters).ok_or_else(invalid)?;
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    Ok((row - 1, column))
}

/// 0-based row of an address.
pub fn row_of(address: &str) -> MappingResult<u32> {
    parse_address(address).map(|(row, _)| row)
}

/// 0-based column of an address.
pub fn column_of(address: &str) -> MappingResult<u32> {
    parse_address(address).map(|(_, column)| column)
}

/// A rectangular `A1:C10` range, as 0-based inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_column: u32,
    pub last_row: u32,
    pub last_column: u32,
}

impl CellRange {
    pub fn parse(range: &str) -> MappingResult<Self> {
        let (first, last) = range
            .split_once(':')
            .ok_or_else(|| MappingError::InvalidAddress {
                address: range.to_string(),
            })?;
        let (first_row, first_column) = parse_address(first)?;
        let (last_row, last_column) = parse_address(last)?;
        Ok(CellRange {
            first_row,
            first_column,
            last_row,
            last_column,
        })
    }
}
