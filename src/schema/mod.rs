pub mod arrow;
pub mod builtin;
pub mod store;
pub mod types;

pub use arrow::{build_arrow_schema, converter_output_type, map_target_type};
pub use store::SchemaStore;
pub use types::{Cell, ColumnSpec, Converter, CustomConverter, DatasetSchema, TargetType};
