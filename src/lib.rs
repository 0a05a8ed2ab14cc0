pub mod error;
pub mod process;
pub mod schema;
pub mod session;

pub use error::{ConvertError, LoadError, SchemaError};
pub use process::{load_csv_data, load_csv_file, CleanTable};
pub use schema::{Cell, ColumnSpec, Converter, DatasetSchema, SchemaStore, TargetType};
pub use session::{Dataset, Session, Uploads};
