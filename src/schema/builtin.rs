// src/schema/builtin.rs
//! The three dataset schemas shipped with the tool.

use once_cell::sync::Lazy;

use super::types::{ColumnSpec, Converter, DatasetSchema, TargetType};

fn plain(name: &str) -> ColumnSpec {
    ColumnSpec::new(name)
}

/// `sd254_users.csv`: credit card holders.
pub static USERS: Lazy<DatasetSchema> = Lazy::new(|| DatasetSchema {
    name: "users".into(),
    columns: vec![
        plain("Birth Year").with_target(TargetType::UInt16),
        plain("Zipcode").with_converter(Converter::ZeroPadZip),
        plain("Per Capita Income - Zipcode").with_converter(Converter::CurrencyToInt),
        plain("Yearly Income - Person").with_converter(Converter::CurrencyToInt),
        plain("Total Debt").with_converter(Converter::CurrencyToInt),
        plain("FICO Score").with_target(TargetType::UInt16),
        plain("Num Credit Cards").with_target(TargetType::UInt8),
    ],
});

/// `sd254_cards.csv`: credit cards.
pub static CARDS: Lazy<DatasetSchema> = Lazy::new(|| DatasetSchema {
    name: "cards".into(),
    columns: vec![
        plain("User"),
        plain("CARD INDEX").with_target(TargetType::UInt8),
        plain("Has Chip").with_converter(Converter::YesNoToBinary),
        plain("Cards Issued").with_target(TargetType::UInt8),
        plain("Year PIN last Changed").with_target(TargetType::UInt16),
        plain("Card on Dark Web").with_converter(Converter::YesNoToBinary),
    ],
});

/// `credit_card_transactions-ibm_v2.csv`: transactions. `Is Fraud?` is the
/// target variable.
pub static TRANSACTIONS: Lazy<DatasetSchema> = Lazy::new(|| DatasetSchema {
    name: "transactions".into(),
    columns: vec![
        plain("User"),
        plain("Card"),
        plain("Year"),
        plain("Month"),
        plain("Day"),
        plain("Time"),
        plain("Amount").with_converter(Converter::CurrencyToFloat),
        plain("Use Chip").with_target(TargetType::Category),
        plain("Merchant City"),
        plain("Merchant State").with_target(TargetType::Category),
        plain("Zip").with_converter(Converter::ZeroPadZip),
        plain("MCC"),
        plain("Errors?"),
        plain("Is Fraud?").with_converter(Converter::YesNoToBinary),
    ],
});
