use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use super::DatasetSchema;
use crate::error::SchemaError;
use crate::session::Dataset;

/// The schema used for each dataset during a run: the built-ins, optionally
/// overridden by `<dir>/<dataset>.json`.
pub struct SchemaStore {
    schemas: HashMap<Dataset, DatasetSchema>,
}

impl SchemaStore {
    /// Store holding only the built-in schemas.
    pub fn builtin() -> Self {
        let schemas = Dataset::ALL
            .iter()
            .map(|d| (*d, d.builtin_schema().clone()))
            .collect();
        Self { schemas }
    }

    /// Initialize from the built-ins, then replace any dataset that has a
    /// `<dataset>.json` in `dir`. Every loaded file must parse and validate.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, SchemaError> {
        let dir = dir.as_ref();
        let mut store = Self::builtin();

        if !dir.is_dir() {
            warn!(dir = %dir.display(), "schema directory not found, using built-in schemas");
            return Ok(store);
        }

        for dataset in Dataset::ALL {
            let path = dir.join(format!("{}.json", dataset.key()));
            if !path.is_file() {
                debug!(dataset = %dataset, "no schema override");
                continue;
            }

            let f = fs::File::open(&path).map_err(|source| SchemaError::Io {
                path: path.clone(),
                source,
            })?;
            let schema: DatasetSchema =
                serde_json::from_reader(io::BufReader::new(f)).map_err(|source| {
                    SchemaError::Json {
                        path: path.clone(),
                        source,
                    }
                })?;
            schema.validate()?;

            info!(dataset = %dataset, path = %path.display(), columns = schema.columns.len(), "loaded schema override");
            store.schemas.insert(dataset, schema);
        }

        Ok(store)
    }

    pub fn get(&self, dataset: Dataset) -> &DatasetSchema {
        self.schemas
            .get(&dataset)
            .unwrap_or_else(|| dataset.builtin_schema())
    }

    /// Pretty JSON for `dataset`'s effective schema.
    pub fn to_json(&self, dataset: Dataset) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.get(dataset))
    }

    /// Write `dataset`'s schema to `<dir>/<dataset>.json`, atomically via a
    /// temporary file, so it can be edited and fed back through [`SchemaStore::new`].
    pub fn write_schema<P: AsRef<Path>>(
        &self,
        dataset: Dataset,
        dir: P,
    ) -> Result<PathBuf, SchemaError> {
        let dir = dir.as_ref();
        let path = dir.join(format!("{}.json", dataset.key()));
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| SchemaError::Io { path, source }
        };

        fs::create_dir_all(dir).map_err(io_err(dir))?;

        let tmp_path = dir.join(format!(".{}.json.tmp", dataset.key()));
        let mut tmp = fs::File::create(&tmp_path).map_err(io_err(&tmp_path))?;

        // pretty-print with a trailing newline
        serde_json::to_writer_pretty(&mut tmp, self.get(dataset)).map_err(|source| {
            SchemaError::Json {
                path: path.clone(),
                source,
            }
        })?;
        tmp.write_all(b"\n").map_err(io_err(&tmp_path))?;

        fs::rename(&tmp_path, &path).map_err(io_err(&path))?;
        debug!(dataset = %dataset, path = %path.display(), "wrote schema");
        Ok(path)
    }
}
