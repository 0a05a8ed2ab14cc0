// src/process/mod.rs
use arrow::{
    array::{Array, ArrayRef, StringArray},
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{Field, Schema},
    record_batch::RecordBatch,
};
use std::{
    fs::File,
    io::{BufReader, Cursor, Read},
    path::Path,
    sync::Arc,
};
use tracing::{debug, info};

use crate::error::LoadError;
use crate::schema::{build_arrow_schema, DatasetSchema};

pub mod cast;
pub mod convert;
pub mod infer;
pub mod table;
pub mod utils;

pub use table::CleanTable;

/// Rows per Arrow batch while reading; batches are concatenated afterwards.
const BATCH_ROWS: usize = 8_192;

/// Read a CSV upload and produce the cleaned table described by `schema`:
/// - only the schema's columns are kept, in the schema's order;
/// - each column's converter runs on every present raw value;
/// - columns without a converter get scalar type inference;
/// - target casts run last.
///
/// The first failure aborts the load; nothing is skipped or defaulted.
#[tracing::instrument(level = "info", skip(reader, schema), fields(dataset = %schema.name))]
pub fn load_csv_data<R: Read>(
    mut reader: R,
    schema: &DatasetSchema,
) -> Result<CleanTable, LoadError> {
    schema.validate()?;

    // 1) Buffer the whole upload
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(LoadError::Read)?;
    let data = utils::strip_bom(&buf);

    // 2) Header → positions of the requested columns
    let headers = read_headers(data)?;
    let projection = project(&headers, schema)?;
    debug!(headers = headers.len(), kept = projection.len(), "resolved columns");

    // 3) Raw text batch holding just those columns
    let raw = read_raw_batch(data, &headers, projection)?;

    // 4) Convert or infer, then cast
    let mut fields = Vec::with_capacity(schema.columns.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.columns.len());
    for (spec, arr) in schema.columns.iter().zip(raw.columns()) {
        let text = arr.as_any().downcast_ref::<StringArray>().ok_or_else(|| {
            LoadError::Arrow(arrow::error::ArrowError::CastError(format!(
                "column `{}` was not read as text",
                spec.name
            )))
        })?;

        let typed = match &spec.converter {
            Some(converter) => convert::convert_column(&spec.name, text, converter)?,
            None => infer::infer_column(text),
        };
        let cleaned = match spec.target {
            Some(target) => cast::cast_column(&spec.name, &typed, target)?,
            None => typed,
        };

        debug!(column = %spec.name, dtype = ?cleaned.data_type(), "cleaned column");
        fields.push(Field::new(&spec.name, cleaned.data_type().clone(), true));
        columns.push(cleaned);
    }

    let batch =
        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(LoadError::Arrow)?;
    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "loaded and cleansed"
    );
    Ok(CleanTable::new(schema.name.clone(), batch))
}

/// Open `path` and run [`load_csv_data`] over it.
pub fn load_csv_file<P: AsRef<Path>>(
    path: P,
    schema: &DatasetSchema,
) -> Result<CleanTable, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_csv_data(BufReader::new(file), schema)
}

fn read_headers(data: &[u8]) -> Result<Vec<String>, LoadError> {
    let (header_schema, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(data), Some(0))
        .map_err(LoadError::Parse)?;

    let headers: Vec<String> = header_schema
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptyInput);
    }
    Ok(headers)
}

/// Index of each requested column in the header; the first match wins.
fn project(headers: &[String], schema: &DatasetSchema) -> Result<Vec<usize>, LoadError> {
    schema
        .columns
        .iter()
        .map(|spec| {
            headers
                .iter()
                .position(|h| h == &spec.name)
                .ok_or_else(|| LoadError::MissingColumn {
                    column: spec.name.clone(),
                    available: headers.to_vec(),
                })
        })
        .collect()
}

fn read_raw_batch(
    data: &[u8],
    headers: &[String],
    projection: Vec<usize>,
) -> Result<RecordBatch, LoadError> {
    let read_schema = build_arrow_schema(headers);
    let projected = Arc::new(read_schema.project(&projection).map_err(LoadError::Arrow)?);

    let reader = ReaderBuilder::new(read_schema)
        .with_header(true)
        .with_batch_size(BATCH_ROWS)
        .with_quote(b'"')
        .with_delimiter(b',')
        .with_projection(projection)
        .build(Cursor::new(data))
        .map_err(LoadError::Parse)?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(LoadError::Parse)?;
    concat_batches(&projected, &batches).map_err(LoadError::Arrow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{builtin, ColumnSpec, Converter, TargetType};
    use arrow::array::{DictionaryArray, Float64Array, Int64Array, UInt16Array, UInt8Array};
    use arrow::datatypes::{DataType, Int32Type};
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,cardclean::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    const USERS_CSV: &str = "\
Person,Current Age,Retirement Age,Birth Year,Birth Month,Gender,Address,Apartment,City,State,Zipcode,Latitude,Longitude,Per Capita Income - Zipcode,Yearly Income - Person,Total Debt,FICO Score,Num Credit Cards
Hazel Robinson,53,66,1966,11,Female,462 Rose Lane,,La Verne,CA,501,34.15,-117.76,$45000,$59696,$127613,787,5
Sasha Sadr,53,68,1966,12,Female,3606 Federal Boulevard,,Little Neck,NY,11363,40.76,-73.74,$77254,$77254,$191349,701,5
Saanvi Lee,81,67,1938,11,Female,766 Third Drive,,West Covina,CA,91792,34.02,-117.89,$26790,$33483,$196,698,5
";

    const CARDS_CSV: &str = "\
User,CARD INDEX,Card Brand,Card Type,Card Number,Expires,CVV,Has Chip,Cards Issued,Credit Limit,Acct Open Date,Year PIN last Changed,Card on Dark Web
0,0,Visa,Debit,4344676511950444,12/2022,623,Maybe,2,$24295,09/2002,2008,No
0,1,Visa,Debit,4956965974959986,12/2020,393,Yes,2,$21968,04/2014,2014,No
";

    const TRANSACTIONS_CSV: &str = "\
User,Card,Year,Month,Day,Time,Amount,Use Chip,Merchant Name,Merchant City,Merchant State,Zip,MCC,Errors?,Is Fraud?
0,0,2002,9,1,06:21,$134.09,Swipe Transaction,3527213246127876953,La Verne,CA,91750.0,5300,,No
0,0,2002,9,1,06:42,$38.48,Swipe Transaction,-727612092139916043,Monterey Park,CA,91754.0,5411,,No
0,0,2002,9,2,06:22,$-120.00,Online Transaction,-727612092139916043,ONLINE,,,5411,Insufficient Balance,Yes
";

    #[test]
    fn users_end_to_end() -> anyhow::Result<()> {
        init_test_logging();
        let table = load_csv_data(USERS_CSV.as_bytes(), &builtin::USERS)?;

        assert_eq!(table.num_rows(), 3);
        assert_eq!(
            table.column_names(),
            vec![
                "Birth Year",
                "Zipcode",
                "Per Capita Income - Zipcode",
                "Yearly Income - Person",
                "Total Debt",
                "FICO Score",
                "Num Credit Cards"
            ]
        );

        let batch = table.batch();
        let zips = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("zip strings");
        assert_eq!(zips.value(0), "00501");
        assert_eq!(zips.value(1), "11363");

        let income = batch
            .column(2)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("income ints");
        assert_eq!(income.value(0), 45000);

        let years = batch
            .column(0)
            .as_any()
            .downcast_ref::<UInt16Array>()
            .expect("u16 years");
        assert_eq!(years.value(2), 1938);
        assert_eq!(batch.column(6).data_type(), &DataType::UInt8);
        Ok(())
    }

    #[test]
    fn bad_category_value_fails_fast() {
        init_test_logging();
        let err = load_csv_data(CARDS_CSV.as_bytes(), &builtin::CARDS).unwrap_err();
        assert!(err.is_type_error());
        match err {
            LoadError::Convert { column, row, value, .. } => {
                assert_eq!(column, "Has Chip");
                assert_eq!(row, 0);
                assert_eq!(value, "Maybe");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn cards_convert_yes_no() -> anyhow::Result<()> {
        let csv = CARDS_CSV.replace("Maybe", "Yes");
        let table = load_csv_data(csv.as_bytes(), &builtin::CARDS)?;
        let batch = table.batch();

        let chip = batch
            .column(2)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("chip ints");
        assert_eq!(chip.values().to_vec(), vec![1, 1]);
        let dark_web = batch
            .column(5)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("dark web ints");
        assert_eq!(dark_web.values().to_vec(), vec![0, 0]);

        let index = batch
            .column(1)
            .as_any()
            .downcast_ref::<UInt8Array>()
            .expect("u8 index");
        assert_eq!(index.values().to_vec(), vec![0, 1]);
        Ok(())
    }

    #[test]
    fn transactions_keep_cents_and_categories() -> anyhow::Result<()> {
        let table = load_csv_data(TRANSACTIONS_CSV.as_bytes(), &builtin::TRANSACTIONS)?;
        let batch = table.batch();
        assert_eq!(batch.num_columns(), 14);
        assert!(!table.column_names().contains(&"Merchant Name".to_string()));

        let amount = batch
            .column(6)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("amount floats");
        assert_eq!(amount.values().to_vec(), vec![134.09, 38.48, -120.0]);

        let use_chip = batch
            .column(7)
            .as_any()
            .downcast_ref::<DictionaryArray<Int32Type>>()
            .expect("use chip category");
        assert_eq!(use_chip.values().len(), 2);

        let state = batch.column(9);
        assert!(matches!(state.data_type(), DataType::Dictionary(_, _)));
        assert!(state.is_null(2));

        let zip = batch
            .column(10)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("zip strings");
        assert_eq!(zip.value(0), "91750");
        assert!(zip.is_null(2));

        assert_eq!(batch.column(5).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(11).data_type(), &DataType::Int64);

        let fraud = batch
            .column(13)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("fraud ints");
        assert_eq!(fraud.values().to_vec(), vec![0, 0, 1]);
        Ok(())
    }

    #[test]
    fn output_order_follows_schema_not_file() -> anyhow::Result<()> {
        let schema = DatasetSchema::new(
            "reordered",
            vec![ColumnSpec::new("c"), ColumnSpec::new("a")],
        )?;
        let table = load_csv_data("a,b,c\n1,x,3\n".as_bytes(), &schema)?;
        assert_eq!(table.column_names(), vec!["c", "a"]);
        Ok(())
    }

    #[test]
    fn repeated_loads_are_identical() -> anyhow::Result<()> {
        let first = load_csv_data(TRANSACTIONS_CSV.as_bytes(), &builtin::TRANSACTIONS)?;
        let second = load_csv_data(TRANSACTIONS_CSV.as_bytes(), &builtin::TRANSACTIONS)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn missing_column_is_reported() {
        let err = load_csv_data("User,Card\n0,0\n".as_bytes(), &builtin::CARDS).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "CARD INDEX"));
    }

    #[test]
    fn ragged_rows_are_parse_errors() {
        let schema = DatasetSchema::new("t", vec![ColumnSpec::new("a")]).expect("schema");
        let err = load_csv_data("a,b\n1,2\n3\n".as_bytes(), &schema).unwrap_err();
        assert!(err.is_parse_error(), "got {err:?}");
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        let err = load_csv_data("".as_bytes(), &builtin::USERS).unwrap_err();
        assert!(err.is_parse_error(), "got {err:?}");
    }

    #[test]
    fn header_only_gives_empty_table() -> anyhow::Result<()> {
        let schema = DatasetSchema::new(
            "t",
            vec![ColumnSpec::new("Amount").with_converter(Converter::CurrencyToFloat)],
        )?;
        let table = load_csv_data("Amount\n".as_bytes(), &schema)?;
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.batch().column(0).data_type(), &DataType::Float64);

        let header = TRANSACTIONS_CSV.lines().next().unwrap_or_default();
        let table = load_csv_data(format!("{header}\n").as_bytes(), &builtin::TRANSACTIONS)?;
        assert_eq!(table.num_rows(), 0);
        let batch = table.batch();
        assert_eq!(batch.column(6).data_type(), &DataType::Float64);
        assert_eq!(batch.column(10).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(13).data_type(), &DataType::Int64);
        assert!(matches!(batch.column(7).data_type(), DataType::Dictionary(_, _)));
        Ok(())
    }

    #[test]
    fn blank_zips_stay_text() -> anyhow::Result<()> {
        let header = TRANSACTIONS_CSV.lines().next().unwrap_or_default();
        let csv = format!(
            "{header}\n0,0,2002,9,2,06:22,$-120.00,Online Transaction,-7276120921,ONLINE,,,5411,,No\n"
        );
        let table = load_csv_data(csv.as_bytes(), &builtin::TRANSACTIONS)?;
        let zips = table.batch().column(10);
        assert_eq!(zips.data_type(), &DataType::Utf8);
        assert_eq!(zips.null_count(), 1);
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let schema = DatasetSchema::new("t", vec![ColumnSpec::new("a")]).expect("schema");
        let err = load_csv_data(&b"a\n\xff\xfe\n"[..], &schema).unwrap_err();
        assert!(err.is_parse_error(), "unexpected error {err:?}");
    }

    #[test]
    fn bom_and_quotes_are_handled() -> anyhow::Result<()> {
        let schema = DatasetSchema::new(
            "t",
            vec![
                ColumnSpec::new("Total Debt").with_converter(Converter::CurrencyToInt),
                ColumnSpec::new("Num Credit Cards").with_target(TargetType::UInt8),
            ],
        )?;
        let csv = "\u{feff}Total Debt,Num Credit Cards\n\"$1,234\",3\n";
        let table = load_csv_data(csv.as_bytes(), &schema)?;
        let debt = table
            .batch()
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("debt ints");
        assert_eq!(debt.value(0), 1234);
        Ok(())
    }

    #[test]
    fn invalid_schema_is_rejected_before_reading() {
        let schema = DatasetSchema {
            name: "broken".into(),
            columns: vec![],
        };
        let err = load_csv_data("a\n1\n".as_bytes(), &schema).unwrap_err();
        assert!(matches!(err, LoadError::Schema(_)));
    }
}
