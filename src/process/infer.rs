use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use std::sync::Arc;

use crate::process::utils::present;

/// Infer the scalar type of one present cell.
pub fn infer_arrow_dtype_from_str(s: &str) -> DataType {
    let s = s.trim();
    if s.parse::<i64>().is_ok() {
        DataType::Int64
    } else if s.parse::<f64>().is_ok() {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// Widen the types seen so far by one more cell's type.
fn widen(acc: Option<DataType>, next: DataType) -> DataType {
    match (acc, next) {
        (None, t) => t,
        (Some(DataType::Utf8), _) | (_, DataType::Utf8) => DataType::Utf8,
        (Some(DataType::Float64), _) | (_, DataType::Float64) => DataType::Float64,
        _ => DataType::Int64,
    }
}

/// Type a raw text column that has no converter: Int64 if every present cell
/// is an integer, Float64 if every present cell is numeric, otherwise the
/// text is kept as-is. Blank cells become null.
pub fn infer_column(raw: &StringArray) -> ArrayRef {
    let mut dtype: Option<DataType> = None;
    for cell in raw.iter().filter_map(present) {
        let next = widen(dtype, infer_arrow_dtype_from_str(cell));
        let done = next == DataType::Utf8;
        dtype = Some(next);
        if done {
            break;
        }
    }

    match dtype {
        Some(DataType::Int64) => {
            let arr: Int64Array = raw
                .iter()
                .map(|c| present(c).and_then(|s| s.trim().parse().ok()))
                .collect();
            Arc::new(arr)
        }
        Some(DataType::Float64) => {
            let arr: Float64Array = raw
                .iter()
                .map(|c| present(c).and_then(|s| s.trim().parse().ok()))
                .collect();
            Arc::new(arr)
        }
        _ => {
            let arr: StringArray = raw.iter().map(present).collect();
            Arc::new(arr)
        }
    }
}
