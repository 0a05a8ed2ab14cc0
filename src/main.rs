use anyhow::{bail, Context, Result};
use cardclean::{ColumnSpec, Dataset, SchemaStore, Session, Uploads};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Load and cleanse the synthetic credit-card users, cards and transactions CSVs"
)]
struct Cli {
    /// Directory holding `<dataset>.json` schema overrides
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform the given CSVs and preview the cleaned tables
    Load {
        /// Credit card users CSV (sd254_users.csv)
        #[arg(long)]
        users: Option<PathBuf>,
        /// Credit card details CSV (sd254_cards.csv)
        #[arg(long)]
        cards: Option<PathBuf>,
        /// Transactions CSV (credit_card_transactions-ibm_v2.csv)
        #[arg(long)]
        transactions: Option<PathBuf>,
        /// Transform only this dataset
        #[arg(long, value_enum)]
        only: Option<Dataset>,
        /// Rows shown per cleaned table
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Print the effective schema of each dataset as JSON
    Schema {
        #[arg(long, value_enum)]
        dataset: Option<Dataset>,
        /// Write `<dataset>.json` files into this directory instead of printing
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ─── 2) resolve schemas ──────────────────────────────────────────
    let store = match &cli.schema_dir {
        Some(dir) => SchemaStore::new(dir)
            .with_context(|| format!("loading schemas from {}", dir.display()))?,
        None => SchemaStore::builtin(),
    };

    match cli.command {
        Command::Load {
            users,
            cards,
            transactions,
            only,
            rows,
        } => {
            let mut uploads = Uploads::new();
            for (dataset, path) in [
                (Dataset::Users, users),
                (Dataset::Cards, cards),
                (Dataset::Transactions, transactions),
            ] {
                if let Some(path) = path {
                    uploads = uploads.with(dataset, path);
                }
            }
            run_load(&uploads, &store, only, rows)
        }
        Command::Schema { dataset, out } => run_schema(&store, dataset, out),
    }
}

fn run_load(uploads: &Uploads, store: &SchemaStore, only: Option<Dataset>, rows: usize) -> Result<()> {
    let datasets: Vec<Dataset> = match only {
        Some(d) => vec![d],
        None => Dataset::ALL.to_vec(),
    };
    check_uploads(uploads, only)?;

    let mut session = Session::new();
    for dataset in datasets {
        describe(dataset, store);

        if !uploads.is_uploaded(dataset) && only.is_none() {
            warn!(%dataset, "no file uploaded, skipping");
            println!("(no file uploaded for {}; skipped)\n", dataset.source_file());
            continue;
        }

        session = session
            .transform(dataset, uploads, store)
            .with_context(|| format!("transforming {}", dataset.label()))?;

        if let Some(table) = session.table(dataset) {
            println!("### Loaded and Cleansed {}\n", dataset.label());
            for (name, dtype) in table.dtypes() {
                println!("  {:<30} {}", name, dtype);
            }
            println!("\n{} rows; first {}:", table.num_rows(), rows.min(table.num_rows()));
            println!("{}\n", table.preview(rows).context("rendering preview")?);
        }
    }

    info!("all done");
    Ok(())
}

/// Fail early when there is nothing to transform, naming the flag to pass.
fn check_uploads(uploads: &Uploads, only: Option<Dataset>) -> Result<()> {
    match only {
        Some(d) if !uploads.is_uploaded(d) => bail!("--{} is required with --only {}", d, d),
        None if !Dataset::ALL.iter().any(|d| uploads.is_uploaded(*d)) => {
            bail!("no CSV given; pass --users, --cards and/or --transactions")
        }
        _ => Ok(()),
    }
}

/// Print what the transform keeps from `dataset` and how it is cleaned.
fn describe(dataset: Dataset, store: &SchemaStore) {
    let schema = store.get(dataset);
    println!("## {} ({})\n", dataset.label(), dataset.source_file());
    println!("Columns kept:");
    for spec in &schema.columns {
        println!("  - {}", describe_column(spec));
    }
    println!("\n{}\n", dataset.note());
}

fn describe_column(spec: &ColumnSpec) -> String {
    let mut line = format!("'{}'", spec.name);
    if let Some(conv) = &spec.converter {
        line.push_str(&format!(" [{}]", conv.name()));
    }
    if let Some(target) = spec.target {
        line.push_str(&format!(" -> {}", target));
    }
    line
}

fn run_schema(store: &SchemaStore, dataset: Option<Dataset>, out: Option<PathBuf>) -> Result<()> {
    let datasets: Vec<Dataset> = match dataset {
        Some(d) => vec![d],
        None => Dataset::ALL.to_vec(),
    };

    for dataset in datasets {
        match &out {
            Some(dir) => {
                let path = store
                    .write_schema(dataset, dir)
                    .with_context(|| format!("writing {} schema", dataset))?;
                info!(%dataset, path = %path.display(), "wrote schema");
            }
            None => {
                let json = store
                    .to_json(dataset)
                    .with_context(|| format!("serializing {} schema", dataset))?;
                println!("{}", json);
            }
        }
    }
    Ok(())
}
