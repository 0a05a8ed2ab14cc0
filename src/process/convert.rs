use arrow::array::{new_null_array, Array, ArrayRef, Float64Array, Int64Array, StringArray};
use std::sync::Arc;
use tracing::trace;

use crate::error::{ConvertError, LoadError};
use crate::process::utils::{present, split_decimal};
use crate::schema::{converter_output_type, Cell, Converter};

const CURRENCY_MARKERS: [char; 4] = ['$', '€', '£', '¥'];

/// A currency string taken apart: sign plus integer and fraction digits.
struct Amount {
    negative: bool,
    int: String,
    frac: String,
}

fn strip_sign(s: &str) -> (Option<bool>, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (Some(true), rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (Some(false), rest)
    } else {
        (None, s)
    }
}

/// Accepts `$50000`, `-$5`, `$-77.00`, `€1,234.5` and bare numbers.
fn parse_currency(raw: &str) -> Result<Amount, ConvertError> {
    let (outer, s) = strip_sign(raw.trim());
    let s = s.strip_prefix(&CURRENCY_MARKERS[..]).unwrap_or(s);
    let (inner, s) = strip_sign(s);
    if outer.is_some() && inner.is_some() {
        return Err(ConvertError::InvalidCurrency);
    }

    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    let (int, frac) = split_decimal(&cleaned).ok_or(ConvertError::InvalidCurrency)?;
    Ok(Amount {
        negative: outer.or(inner).unwrap_or(false),
        int: int.to_string(),
        frac: frac.to_string(),
    })
}

/// Strip the currency marker and parse a whole amount: `"$50000"` → `50000`.
/// A fraction is accepted only when it is all zeros.
pub fn currency_to_int(raw: &str) -> Result<i64, ConvertError> {
    let amount = parse_currency(raw)?;
    if amount.frac.bytes().any(|b| b != b'0') {
        return Err(ConvertError::FractionalAmount(raw.trim().to_string()));
    }
    let value: i64 = amount
        .int
        .parse()
        .map_err(|_| ConvertError::InvalidCurrency)?;
    Ok(if amount.negative { -value } else { value })
}

/// Strip the currency marker and keep the cents: `"$245.30"` → `245.3`.
pub fn currency_to_float(raw: &str) -> Result<f64, ConvertError> {
    let amount = parse_currency(raw)?;
    let frac = if amount.frac.is_empty() { "0" } else { amount.frac.as_str() };
    let value: f64 = format!("{}.{}", amount.int, frac)
        .parse()
        .map_err(|_| ConvertError::InvalidCurrency)?;
    Ok(if amount.negative { -value } else { value })
}

pub fn yes_no_to_binary(raw: &str) -> Result<i64, ConvertError> {
    match raw.trim() {
        "Yes" => Ok(1),
        "No" => Ok(0),
        _ => Err(ConvertError::UnexpectedCategory),
    }
}

/// Render a numeric postal code as at least 5 characters, left-padded with
/// zeros: `501` → `"00501"`. Float renderings with a zero fraction (`501.0`)
/// are accepted.
pub fn zero_pad_zip(raw: &str) -> Result<String, ConvertError> {
    let (int, frac) = split_decimal(raw.trim()).ok_or(ConvertError::InvalidPostalCode)?;
    if frac.bytes().any(|b| b != b'0') {
        return Err(ConvertError::InvalidPostalCode);
    }
    Ok(format!("{:0>5}", int))
}

/// Run `converter` over every present cell of a raw text column and build
/// the narrowest array that holds all of its outputs.
pub fn convert_column(
    column: &str,
    raw: &StringArray,
    converter: &Converter,
) -> Result<ArrayRef, LoadError> {
    let mut cells = Vec::with_capacity(raw.len());
    for (row, cell) in raw.iter().enumerate() {
        let Some(value) = present(cell) else {
            cells.push(None);
            continue;
        };
        let converted = converter
            .apply(value)
            .map_err(|source| LoadError::Convert {
                column: column.to_string(),
                row,
                value: value.to_string(),
                source,
            })?;
        cells.push(Some(converted));
    }

    trace!(column, converter = converter.name(), rows = cells.len(), "converted column");
    if cells.iter().all(Option::is_none) {
        return Ok(new_null_array(&converter_output_type(converter), cells.len()));
    }
    Ok(cells_to_array(cells))
}

/// All integers → Int64; integers and floats → Float64; any string → Utf8.
fn cells_to_array(cells: Vec<Option<Cell>>) -> ArrayRef {
    let has_str = cells.iter().flatten().any(|c| matches!(c, Cell::Str(_)));
    let has_float = cells.iter().flatten().any(|c| matches!(c, Cell::Float(_)));

    if has_str {
        let arr: StringArray = cells
            .into_iter()
            .map(|c| {
                c.map(|c| match c {
                    Cell::Int(v) => v.to_string(),
                    Cell::Float(v) => v.to_string(),
                    Cell::Str(s) => s,
                })
            })
            .collect();
        Arc::new(arr)
    } else if has_float {
        let arr: Float64Array = cells
            .into_iter()
            .map(|c| match c {
                Some(Cell::Int(v)) => Some(v as f64),
                Some(Cell::Float(v)) => Some(v),
                _ => None,
            })
            .collect();
        Arc::new(arr)
    } else {
        let arr: Int64Array = cells
            .into_iter()
            .map(|c| match c {
                Some(Cell::Int(v)) => Some(v),
                _ => None,
            })
            .collect();
        Arc::new(arr)
    }
}
