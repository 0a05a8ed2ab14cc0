// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::types::{Converter, TargetType};

/// Map a cast target into an Arrow DataType.
///
/// Covers:
/// - u8       → UInt8
/// - u16      → UInt16
/// - category → Dictionary(Int32, Utf8)
pub fn map_target_type(target: TargetType) -> DataType {
    match target {
        TargetType::UInt8 => DataType::UInt8,
        TargetType::UInt16 => DataType::UInt16,
        TargetType::Category => {
            DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
        }
    }
}

/// Arrow type a converter produces when every cell it saw was missing.
pub fn converter_output_type(converter: &Converter) -> DataType {
    match converter {
        Converter::CurrencyToInt | Converter::YesNoToBinary => DataType::Int64,
        Converter::CurrencyToFloat => DataType::Float64,
        Converter::ZeroPadZip | Converter::Custom(_) => DataType::Utf8,
    }
}

/// Build the read schema for a CSV header: every column nullable Utf8, so
/// the raw text reaches the converters untouched.
pub fn build_arrow_schema(headers: &[String]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = headers
        .iter()
        .map(|name| ArrowField::new(name, DataType::Utf8, /* nullable = */ true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}
