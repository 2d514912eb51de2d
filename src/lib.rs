//! Small file-access helpers: read delimited text and JSON, write or append
//! text, and make sure directories exist.

pub mod data;
pub mod error;
pub mod fs;

pub use data::export::Exporter;
pub use data::loader::{DelimitedOptions, Encoding, Importer};
pub use data::model::{CellValue, Column, ColumnType, TabularDataset};
pub use error::{Error, Result};
pub use fs::ensure_directory;
