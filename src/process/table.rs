use arrow::{
    datatypes::DataType, error::ArrowError, record_batch::RecordBatch,
    util::pretty::pretty_format_batches,
};

/// A cleaned dataset held in memory for the rest of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    name: String,
    batch: RecordBatch,
}

impl CleanTable {
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    /// Name of the schema that produced this table.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// `(column, type)` pairs in output order.
    pub fn dtypes(&self) -> Vec<(String, DataType)> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| (f.name().clone(), f.data_type().clone()))
            .collect()
    }

    /// The first `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> RecordBatch {
        self.batch.slice(0, n.min(self.batch.num_rows()))
    }

    /// The first `n` rows rendered as a text table.
    pub fn preview(&self, n: usize) -> Result<String, ArrowError> {
        Ok(pretty_format_batches(&[self.head(n)])?.to_string())
    }
}
