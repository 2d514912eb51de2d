/// Data layer: table and JSON import, text export.
///
/// Architecture:
/// ```text
///  .tsv / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  Importer: parse file → TabularDataset / JSON value
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ TabularDataset │  typed columns, rows, unique values
///   └────────────────┘
///
///   text / JSON ──▶ ┌──────────┐
///                   │  export  │  Exporter: write or append to file
///                   └──────────┘
/// ```
pub mod export;
pub mod loader;
pub mod model;
