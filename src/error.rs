// src/error.rs

use arrow::error::ArrowError;
use std::path::PathBuf;
use thiserror::Error;

use crate::schema::TargetType;
use crate::session::Dataset;

/// Why a single raw value could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("not a currency amount")]
    InvalidCurrency,
    #[error("currency amount {0} has a fractional part")]
    FractionalAmount(String),
    #[error("expected `Yes` or `No`")]
    UnexpectedCategory,
    #[error("not a numeric postal code")]
    InvalidPostalCode,
    #[error("{0}")]
    Custom(String),
}

/// Schema construction, validation and schema-file failures.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema `{0}` has no columns")]
    NoColumns(String),
    #[error("schema `{schema}` has a column with an empty name")]
    EmptyColumnName { schema: String },
    #[error("schema `{schema}` lists column `{column}` more than once")]
    DuplicateColumn { schema: String, column: String },
    #[error("schema `{schema}` maps `{column}` but does not list it")]
    UnknownColumn { schema: String, column: String },
    #[error("schema `{schema}`: converter `{converter}` cannot feed a `{target}` cast on `{column}`")]
    Incompatible {
        schema: String,
        column: String,
        converter: String,
        target: TargetType,
    },
    #[error("reading schema file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing schema file {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything that can stop a CSV from becoming a cleaned table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("opening {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reading upload")]
    Read(#[source] std::io::Error),
    #[error("input has no header row")]
    EmptyInput,
    #[error("malformed CSV")]
    Parse(#[source] ArrowError),
    #[error("column `{column}` not found (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("column `{column}`, row {row}: cannot convert {value:?}")]
    Convert {
        column: String,
        row: usize,
        value: String,
        #[source]
        source: ConvertError,
    },
    #[error("column `{column}`, row {row}: cannot cast {value:?} to {target}")]
    Cast {
        column: String,
        row: usize,
        value: String,
        target: TargetType,
    },
    #[error("column `{column}`, row {row}: missing value cannot be cast to {target}")]
    CastNull {
        column: String,
        row: usize,
        target: TargetType,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("no file uploaded for {0}")]
    NotUploaded(Dataset),
    #[error("building cleaned table")]
    Arrow(#[source] ArrowError),
}

impl LoadError {
    /// True for failures of a converter or a cast on a specific value.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            LoadError::Convert { .. } | LoadError::Cast { .. } | LoadError::CastNull { .. }
        )
    }

    /// True when the input itself could not be read as CSV.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, LoadError::Parse(_) | LoadError::EmptyInput)
    }
}
