// src/session.rs

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::LoadError;
use crate::process::{load_csv_file, CleanTable};
use crate::schema::{builtin, DatasetSchema, SchemaStore};

/// The three source tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Dataset {
    Users,
    Cards,
    Transactions,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Users, Dataset::Cards, Dataset::Transactions];

    /// Short lowercase key, also the schema-override file stem.
    pub fn key(&self) -> &'static str {
        match self {
            Dataset::Users => "users",
            Dataset::Cards => "cards",
            Dataset::Transactions => "transactions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dataset::Users => "Credit Card Users",
            Dataset::Cards => "Credit Card Details",
            Dataset::Transactions => "Credit Card Transactions",
        }
    }

    /// File name of the table in the public dataset.
    pub fn source_file(&self) -> &'static str {
        match self {
            Dataset::Users => "sd254_users.csv",
            Dataset::Cards => "sd254_cards.csv",
            Dataset::Transactions => "credit_card_transactions-ibm_v2.csv",
        }
    }

    pub fn builtin_schema(&self) -> &'static DatasetSchema {
        match self {
            Dataset::Users => &builtin::USERS,
            Dataset::Cards => &builtin::CARDS,
            Dataset::Transactions => &builtin::TRANSACTIONS,
        }
    }

    /// What the transform does to this dataset beyond picking columns.
    pub fn note(&self) -> &'static str {
        match self {
            Dataset::Users => {
                "Removes the '$' from the income and debt columns and converts them into \
                 integers; Zipcode is zero-padded to 5 characters."
            }
            Dataset::Cards => "Converts the 'Yes'/'No' columns into binary 1/0.",
            Dataset::Transactions => {
                "Removes the '$' from Amount and converts it into a float; Zip is zero-padded; \
                 'Is Fraud?' (the target variable) becomes binary 1/0; Use Chip and Merchant \
                 State become categories."
            }
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which file, if any, was supplied for each dataset. Built once and passed
/// to every transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uploads {
    files: BTreeMap<Dataset, PathBuf>,
}

impl Uploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dataset: Dataset, path: impl Into<PathBuf>) -> Self {
        self.files.insert(dataset, path.into());
        self
    }

    pub fn path(&self, dataset: Dataset) -> Option<&Path> {
        self.files.get(&dataset).map(PathBuf::as_path)
    }

    pub fn is_uploaded(&self, dataset: Dataset) -> bool {
        self.files.contains_key(&dataset)
    }
}

/// Cleaned tables produced so far in this run.
#[derive(Debug, Clone, Default)]
pub struct Session {
    tables: BTreeMap<Dataset, CleanTable>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `dataset`'s own upload with `dataset`'s own schema and return a
    /// session holding the result. `self` is left untouched on failure.
    #[tracing::instrument(level = "info", skip(self, uploads, store))]
    pub fn transform(
        &self,
        dataset: Dataset,
        uploads: &Uploads,
        store: &SchemaStore,
    ) -> Result<Session, LoadError> {
        let path = uploads
            .path(dataset)
            .ok_or(LoadError::NotUploaded(dataset))?;
        info!(path = %path.display(), "transforming upload");

        let table = load_csv_file(path, store.get(dataset))?;
        let mut tables = self.tables.clone();
        tables.insert(dataset, table);
        Ok(Session { tables })
    }

    pub fn table(&self, dataset: Dataset) -> Option<&CleanTable> {
        self.tables.get(&dataset)
    }

    /// Loaded tables in dataset order.
    pub fn tables(&self) -> impl Iterator<Item = (Dataset, &CleanTable)> {
        self.tables.iter().map(|(d, t)| (*d, t))
    }
}
