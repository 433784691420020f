//! Utility functions.

mod timestamps;

pub use timestamps::{file_timestamp, iso_timestamp, now_utc, Timestamp};
