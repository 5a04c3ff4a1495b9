//! Utility modules.

pub mod datetime;

pub use datetime::{DateTimeParseError, format_date_102, format_unb_datetime, parse_date_102};
