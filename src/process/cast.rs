use arrow::{
    array::{Array, ArrayRef, Float64Array, Int64Array, StringArray, UInt16Array, UInt8Array},
    compute::{cast_with_options, CastOptions},
    datatypes::DataType,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::LoadError;
use crate::schema::{map_target_type, TargetType};

/// Cast a converted or inferred column to its target type.
///
/// Unsigned targets are strict: a missing value, a negative or fractional
/// number, non-numeric text, or a value wider than the target is an error
/// naming the offending row.
pub fn cast_column(
    column: &str,
    arr: &ArrayRef,
    target: TargetType,
) -> Result<ArrayRef, LoadError> {
    debug!(column, from = ?arr.data_type(), to = %target, "casting column");
    match target {
        TargetType::Category => to_category(arr),
        TargetType::UInt8 | TargetType::UInt16 => {
            let values = unsigned_values(column, arr, target)?;
            let out: ArrayRef = match target {
                TargetType::UInt8 => Arc::new(UInt8Array::from_iter_values(
                    values.into_iter().map(|v| v as u8),
                )),
                _ => Arc::new(UInt16Array::from_iter_values(
                    values.into_iter().map(|v| v as u16),
                )),
            };
            Ok(out)
        }
    }
}

/// Dictionary-encode the column's text form.
fn to_category(arr: &ArrayRef) -> Result<ArrayRef, LoadError> {
    let text = if arr.data_type() == &DataType::Utf8 {
        Arc::clone(arr)
    } else {
        arrow::compute::cast(arr, &DataType::Utf8).map_err(LoadError::Arrow)?
    };
    arrow::compute::cast(&text, &map_target_type(TargetType::Category)).map_err(LoadError::Arrow)
}

/// Pull every row out as a `u64` that fits `target`, or fail on the first
/// row that does not.
fn unsigned_values(
    column: &str,
    arr: &ArrayRef,
    target: TargetType,
) -> Result<Vec<u64>, LoadError> {
    let cells: Vec<Option<Result<u64, String>>> = match arr.data_type() {
        DataType::Int64 => downcast::<Int64Array>(arr)?
            .iter()
            .map(|c| c.map(|v| u64::try_from(v).map_err(|_| v.to_string())))
            .collect(),
        DataType::Float64 => downcast::<Float64Array>(arr)?
            .iter()
            .map(|c| {
                c.map(|v| {
                    if v.fract() == 0.0 && v >= 0.0 && v <= u64::MAX as f64 {
                        Ok(v as u64)
                    } else {
                        Err(v.to_string())
                    }
                })
            })
            .collect(),
        DataType::Utf8 => downcast::<StringArray>(arr)?
            .iter()
            .map(|c| {
                c.filter(|s| !s.trim().is_empty())
                    .map(|s| s.trim().parse::<u64>().map_err(|_| s.to_string()))
            })
            .collect(),
        _ => {
            let opts = CastOptions {
                safe: false,
                ..Default::default()
            };
            let wide = cast_with_options(arr, &DataType::UInt64, &opts).map_err(LoadError::Arrow)?;
            let wide = downcast::<arrow::array::UInt64Array>(&wide)?;
            wide.iter().map(|c| c.map(Ok)).collect()
        }
    };

    let max = target.max_value().unwrap_or(u64::MAX);
    let mut out = Vec::with_capacity(cells.len());
    for (row, cell) in cells.into_iter().enumerate() {
        match cell {
            None => {
                return Err(LoadError::CastNull {
                    column: column.to_string(),
                    row,
                    target,
                })
            }
            Some(Err(value)) => {
                return Err(LoadError::Cast {
                    column: column.to_string(),
                    row,
                    value,
                    target,
                })
            }
            Some(Ok(v)) if v > max => {
                return Err(LoadError::Cast {
                    column: column.to_string(),
                    row,
                    value: v.to_string(),
                    target,
                })
            }
            Some(Ok(v)) => out.push(v),
        }
    }
    Ok(out)
}

fn downcast<T: Array + 'static>(arr: &ArrayRef) -> Result<&T, LoadError> {
    arr.as_any().downcast_ref::<T>().ok_or_else(|| {
        LoadError::Arrow(arrow::error::ArrowError::CastError(format!(
            "unexpected array layout for {:?}",
            arr.data_type()
        )))
    })
}
