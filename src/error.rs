//! # Error Types
//!
//! Every fallible operation in the crate returns [`SheetError`].
//!
//! Parsing itself is best-effort: unrecognized tokens are skipped and reported as
//! [`SkippedToken`](crate::parser::SkippedToken) values, not errors. The only parse
//! failure is a sheet with nothing playable in it.
//!
//! ## Usage
//! ```rust
//! use sheetplay::{parse_measures, SheetError};
//!
//! match parse_measures("| |") {
//!     Ok(parsed) => println!("{} measures", parsed.measures.len()),
//!     Err(SheetError::NoSheetData) => eprintln!("nothing to play"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    /// The notation text contained no notes, chords or rests.
    ///
    /// # Example
    /// ```
    /// # use sheetplay::SheetError;
    /// assert_eq!(SheetError::NoSheetData.to_string(), "No sheet data found in notation text");
    /// ```
    #[error("No sheet data found in notation text")]
    NoSheetData,

    /// Invalid YAML frontmatter.
    ///
    /// # Example
    /// ```
    /// # use sheetplay::SheetError;
    /// let err = SheetError::MetadataError("time-signature must be in format N/D".to_string());
    /// assert_eq!(err.to_string(), "Invalid metadata: time-signature must be in format N/D");
    /// ```
    #[error("Invalid metadata: {0}")]
    MetadataError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
