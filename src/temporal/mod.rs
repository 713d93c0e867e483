//! Date handling for chart groups
//!
//! - [`date`]: normalize ISO strings and epoch milliseconds to calendar dates
//! - [`filter`]: build per-group query predicates at a time frequency

pub mod date;
pub mod filter;

pub use date::{to_date, DateValue};
pub use filter::{build_group_filter, build_value_filter, Frequency, GroupFilter};
