// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt,
    sync::Arc,
};

use crate::error::{ConvertError, SchemaError};
use crate::process::convert;

/// A cleaned scalar as produced by a converter.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Str(String),
}

pub type ConvertFn = dyn Fn(&str) -> Result<Cell, ConvertError> + Send + Sync;

/// A named converter registered in code. Never written to schema JSON.
#[derive(Clone)]
pub struct CustomConverter {
    name: String,
    func: Arc<ConvertFn>,
}

impl CustomConverter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Cell, ConvertError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomConverter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomConverter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Per-value cleansing rule, applied to raw CSV text before type inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Converter {
    /// `"$50000"` → 50000
    CurrencyToInt,
    /// `"$245.30"` → 245.3
    CurrencyToFloat,
    /// `"Yes"` → 1, `"No"` → 0
    YesNoToBinary,
    /// `501` → `"00501"`
    ZeroPadZip,
    #[serde(skip)]
    Custom(CustomConverter),
}

impl Converter {
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Cell, ConvertError> + Send + Sync + 'static,
    {
        Converter::Custom(CustomConverter::new(name, func))
    }

    pub fn apply(&self, raw: &str) -> Result<Cell, ConvertError> {
        match self {
            Converter::CurrencyToInt => convert::currency_to_int(raw).map(Cell::Int),
            Converter::CurrencyToFloat => convert::currency_to_float(raw).map(Cell::Float),
            Converter::YesNoToBinary => convert::yes_no_to_binary(raw).map(Cell::Int),
            Converter::ZeroPadZip => convert::zero_pad_zip(raw).map(Cell::Str),
            Converter::Custom(c) => (c.func)(raw),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Converter::CurrencyToInt => "currency_to_int",
            Converter::CurrencyToFloat => "currency_to_float",
            Converter::YesNoToBinary => "yes_no_to_binary",
            Converter::ZeroPadZip => "zero_pad_zip",
            Converter::Custom(c) => c.name(),
        }
    }
}

/// Compact type a column is cast to once converters and inference have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    #[serde(rename = "u8")]
    UInt8,
    #[serde(rename = "u16")]
    UInt16,
    #[serde(rename = "category")]
    Category,
}

impl TargetType {
    /// Upper bound for the unsigned integer targets.
    pub fn max_value(&self) -> Option<u64> {
        match self {
            TargetType::UInt8 => Some(u8::MAX as u64),
            TargetType::UInt16 => Some(u16::MAX as u64),
            TargetType::Category => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.max_value().is_some()
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetType::UInt8 => "u8",
            TargetType::UInt16 => "u16",
            TargetType::Category => "category",
        })
    }
}

/// One retained column: its header name plus optional converter and cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<Converter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetType>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            converter: None,
            target: None,
        }
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_target(mut self, target: TargetType) -> Self {
        self.target = Some(target);
        self
    }
}

/// Declarative description of one dataset: which columns to keep, in order,
/// and how each one is cleaned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl DatasetSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Result<Self, SchemaError> {
        let schema = Self {
            name: name.into(),
            columns,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Build a schema from a column list plus separate converter and target
    /// mappings. Every mapping key must name a listed column.
    pub fn from_parts<C, K, T>(
        name: impl Into<String>,
        columns: &[&str],
        converters: C,
        targets: T,
    ) -> Result<Self, SchemaError>
    where
        C: IntoIterator<Item = (K, Converter)>,
        T: IntoIterator<Item = (K, TargetType)>,
        K: AsRef<str>,
    {
        let name = name.into();
        let mut specs: Vec<ColumnSpec> = columns.iter().map(|c| ColumnSpec::new(*c)).collect();

        for (key, converter) in converters {
            let spec = find_spec(&mut specs, &name, key.as_ref())?;
            spec.converter = Some(converter);
        }
        for (key, target) in targets {
            let spec = find_spec(&mut specs, &name, key.as_ref())?;
            spec.target = Some(target);
        }

        Self::new(name, specs)
    }

    /// Static checks: at least one column, unique non-empty names, and no
    /// converter whose output a target cast would mangle.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::NoColumns(self.name.clone()));
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for col in &self.columns {
            if col.name.is_empty() {
                return Err(SchemaError::EmptyColumnName {
                    schema: self.name.clone(),
                });
            }
            if !seen.insert(col.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    schema: self.name.clone(),
                    column: col.name.clone(),
                });
            }
            if let (Some(conv), Some(target)) = (&col.converter, col.target) {
                let clash = target.is_integer()
                    && matches!(conv, Converter::ZeroPadZip | Converter::CurrencyToFloat);
                if clash {
                    return Err(SchemaError::Incompatible {
                        schema: self.name.clone(),
                        column: col.name.clone(),
                        converter: conv.name().to_string(),
                        target,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn find_spec<'a>(
    specs: &'a mut [ColumnSpec],
    schema: &str,
    column: &str,
) -> Result<&'a mut ColumnSpec, SchemaError> {
    specs
        .iter_mut()
        .find(|s| s.name == column)
        .ok_or_else(|| SchemaError::UnknownColumn {
            schema: schema.to_string(),
            column: column.to_string(),
        })
}
