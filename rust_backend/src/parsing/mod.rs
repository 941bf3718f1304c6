//! Decoding of the inbound work record stream.
//!
//! # Parsers
//!
//! - [`records`]: Parse JSON-formatted work records
//!
//! # Example
//!
//! ```no_run
//! use pm_progress::parsing::records::parse_records_file;
//! use std::path::Path;
//!
//! let records = parse_records_file(Path::new("records.json"))
//!     .expect("Failed to parse records");
//! ```

pub mod records;


pub use records::{parse_records_file, parse_records_str, WorkRecord};
