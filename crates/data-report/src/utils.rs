//! Shared utilities for the report pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use chrono::{DateTime, Local};
use polars::prelude::*;
use std::path::Path;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Stringify every value of a Series; nulls become the empty string.
pub fn series_to_strings(series: &Series) -> PolarsResult<Vec<String>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string).unwrap_or_default())
        .collect())
}

/// Numeric values of a Series with nulls, NaN and non-numeric entries read as zero.
pub fn series_to_f64_zero_filled(series: &Series) -> PolarsResult<Vec<f64>> {
    let as_f64 = series.cast(&DataType::Float64)?;
    Ok(as_f64
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()).unwrap_or(0.0))
        .collect())
}

// =============================================================================
// String Utilities
// =============================================================================

/// Truncate to at most `max_chars` characters (not bytes).
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Final component of a path as a String.
pub fn file_base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Lowercased file extension, empty when absent.
pub fn extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// =============================================================================
// Timestamp Utilities
// =============================================================================

/// Run directory name, resolution of one second.
pub fn run_folder_name(now: &DateTime<Local>) -> String {
    format!("Data-Report-{}", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Timestamp suffix shared by all files of one run, millisecond resolution.
pub fn file_timestamp(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S_%3f").to_string()
}

// =============================================================================
// Tests
// =============================================================================
