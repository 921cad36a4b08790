//! Date utilities

use chrono::{Local, NaiveDate};

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `DDMonYY` stamp used as the prefix of dataset names (e.g. `19Oct26`)
pub fn dataset_date_stamp(date: NaiveDate) -> String {
    date.format("%d%b%y").to_string()
}

/// ISO 8601 calendar date (`YYYY-MM-DD`)
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
