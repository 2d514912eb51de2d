use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, ColumnType, TabularDataset};
use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Cell texts read as missing values, the default Pandas NA set.
const NA_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Text encoding of a file being imported.
///
/// Only UTF-8 is supported. Any other label is rejected when parsed rather
/// than being silently read as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    #[default]
    Utf8,
    /// UTF-8 with a leading byte-order mark stripped if present.
    Utf8Sig,
}

impl Encoding {
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf8Sig => "utf-8-sig",
        }
    }

    fn decode<'a>(self, path: &Path, bytes: &'a [u8]) -> Result<&'a str> {
        let bytes = match self {
            Encoding::Utf8 => bytes,
            Encoding::Utf8Sig => bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
        };
        std::str::from_utf8(bytes)
            .map_err(|e| Error::parse(path, format!("invalid {} data: {e}", self.label())))
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "utf_8" => Ok(Encoding::Utf8),
            "utf-8-sig" | "utf8-sig" | "utf_8_sig" => Ok(Encoding::Utf8Sig),
            _ => Err(Error::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Encoding> for String {
    fn from(e: Encoding) -> Self {
        e.label().to_string()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How to read a delimited text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelimitedOptions {
    /// Field separator. Must be a single ASCII character.
    pub delimiter: char,
    /// Parse straight from a buffered reader instead of reading the whole file first.
    pub low_memory: bool,
    pub encoding: Encoding,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            low_memory: false,
            encoding: Encoding::Utf8,
        }
    }
}

impl DelimitedOptions {
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Importer
// ---------------------------------------------------------------------------

/// Reads tables and JSON documents from a single file path.
#[derive(Debug, Clone)]
pub struct Importer {
    path: PathBuf,
}

impl Importer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file as delimited text. The first row names the columns.
    pub fn read_delimited(&self, options: &DelimitedOptions) -> Result<TabularDataset> {
        let path = self.path.as_path();
        debug!(
            "reading delimited file {} (delimiter {:?}, low_memory {}, encoding {})",
            path.display(),
            options.delimiter,
            options.low_memory,
            options.encoding
        );

        if !options.delimiter.is_ascii() {
            return Err(Error::InvalidDelimiter(options.delimiter));
        }
        let mut builder = csv::ReaderBuilder::new();
        builder.delimiter(options.delimiter as u8).flexible(true);

        let file = File::open(path).map_err(|e| Error::read(path, e))?;
        let dataset = if options.low_memory {
            parse_table(path, builder.from_reader(BufReader::new(file)))?
        } else {
            let bytes = read_all(path, file)?;
            let text = options.encoding.decode(path, &bytes)?;
            let text = text.strip_prefix('\u{feff}').unwrap_or(text);
            parse_table(path, builder.from_reader(text.as_bytes()))?
        };

        debug!(
            "read {} rows x {} columns from {}",
            dataset.len(),
            dataset.width(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse the file as a JSON document.
    pub fn read_json(&self, encoding: Encoding) -> Result<JsonValue> {
        self.read_json_as(encoding)
    }

    /// Parse the file as JSON straight into `T`.
    pub fn read_json_as<T: DeserializeOwned>(&self, encoding: Encoding) -> Result<T> {
        let path = self.path.as_path();
        debug!("reading JSON file {} ({encoding})", path.display());

        let file = File::open(path).map_err(|e| Error::read(path, e))?;
        let bytes = read_all(path, file)?;
        let text = encoding.decode(path, &bytes)?;
        serde_json::from_str(text).map_err(|e| Error::parse(path, e.to_string()))
    }
}

fn read_all(path: &Path, mut file: File) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| Error::io(path, e))?;
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Delimited parsing
// ---------------------------------------------------------------------------

fn parse_table<R: Read>(path: &Path, mut reader: csv::Reader<R>) -> Result<TabularDataset> {
    let raw_headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    if raw_headers.is_empty() {
        return Err(Error::parse(path, "no columns to parse from file"));
    }
    let headers = clean_headers(raw_headers.iter());
    let width = headers.len();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    let mut n_rows = 0;

    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > width {
            return Err(Error::parse(
                path,
                format!("expected {width} fields in line {line}, saw {}", record.len()),
            ));
        }
        if record.len() < width {
            trace!(
                "line {line}: padding {} missing fields with null",
                width - record.len()
            );
        }

        for (idx, column) in cells.iter_mut().enumerate() {
            let value = record.get(idx).filter(|v| !NA_MARKERS.contains(v));
            column.push(value.map(str::to_string));
        }
        n_rows += 1;
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| build_column(name, raw, n_rows))
        .collect();

    Ok(TabularDataset::from_columns(columns, n_rows))
}

fn csv_error(path: &Path, err: csv::Error) -> Error {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => Error::io(path, source),
        _ => Error::parse(path, message),
    }
}

/// Name empty headers `Unnamed: {i}` and suffix repeated names with `.1`, `.2`, ...
fn clean_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (i, header) in raw.enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {i}")
        } else {
            header.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

fn build_column(name: String, raw: Vec<Option<String>>, n_rows: usize) -> Column {
    let dtype = infer_column_type(&raw, n_rows);
    let values = raw
        .into_iter()
        .map(|cell| match cell {
            None => CellValue::Null,
            Some(text) => convert_cell(text, dtype),
        })
        .collect();
    Column {
        name,
        dtype,
        values,
    }
}

fn infer_column_type(raw: &[Option<String>], n_rows: usize) -> ColumnType {
    let present: Vec<&str> = raw.iter().flatten().map(String::as_str).collect();
    let has_nulls = present.len() < raw.len();

    if present.is_empty() {
        return if n_rows > 0 {
            ColumnType::Float
        } else {
            ColumnType::String
        };
    }
    if present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
        // an integer column cannot hold missing values, same as Pandas
        return if has_nulls {
            ColumnType::Float
        } else {
            ColumnType::Integer
        };
    }
    if present.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
        return ColumnType::Float;
    }
    if present.iter().all(|s| parse_bool(s).is_some()) {
        return ColumnType::Bool;
    }
    ColumnType::String
}

fn convert_cell(text: String, dtype: ColumnType) -> CellValue {
    let parsed = match dtype {
        ColumnType::Integer => text.trim().parse().ok().map(CellValue::Integer),
        ColumnType::Float => text.trim().parse().ok().map(CellValue::Float),
        ColumnType::Bool => parse_bool(&text).map(CellValue::Bool),
        ColumnType::String => None,
    };
    parsed.unwrap_or(CellValue::String(text))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn file_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    fn read(content: &str, delimiter: char) -> Result<TabularDataset> {
        let file = file_with(content.as_bytes());
        Importer::new(file.path()).read_delimited(&DelimitedOptions::with_delimiter(delimiter))
    }

    #[test]
    fn defaults_match_plain_utf8_tab_separated() {
        let options = DelimitedOptions::default();
        assert_eq!(options.delimiter, '\t');
        assert!(!options.low_memory);
        assert_eq!(options.encoding, Encoding::Utf8);
    }

    #[test]
    fn tab_is_the_default_delimiter() {
        let file = file_with(b"name\tscore\nada\t3\n");
        let ds = Importer::new(file.path())
            .read_delimited(&DelimitedOptions::default())
            .unwrap();
        assert_eq!(ds.column_names(), vec!["name", "score"]);
        assert_eq!(ds.column("score").unwrap().dtype, ColumnType::Integer);
    }

    #[test]
    fn integer_column_with_missing_value_becomes_float() {
        let ds = read("a,b\n1,x\n,y\n3,z\n", ',').unwrap();
        let a = ds.column("a").unwrap();
        assert_eq!(a.dtype, ColumnType::Float);
        assert_eq!(
            a.values,
            vec![CellValue::Float(1.0), CellValue::Null, CellValue::Float(3.0)]
        );
        assert_eq!(ds.column("b").unwrap().dtype, ColumnType::String);
    }

    #[test]
    fn mixed_ints_and_floats_are_float() {
        let ds = read("v\n1\n2.5\n", ',').unwrap();
        assert_eq!(ds.column("v").unwrap().dtype, ColumnType::Float);
    }

    #[test]
    fn na_markers_are_null() {
        let ds = read("v,w\nNA,1\nnull,2\nok,3\n", ',').unwrap();
        let v = ds.column("v").unwrap();
        assert_eq!(v.dtype, ColumnType::String);
        assert!(v.values[0].is_null());
        assert!(v.values[1].is_null());
        assert_eq!(v.values[2].as_str(), Some("ok"));
    }

    #[test]
    fn boolean_column_is_detected() {
        let ds = read("flag\nTrue\nfalse\n", ',').unwrap();
        let flag = ds.column("flag").unwrap();
        assert_eq!(flag.dtype, ColumnType::Bool);
        assert_eq!(flag.values, vec![CellValue::Bool(true), CellValue::Bool(false)]);
    }

    #[test]
    fn string_column_keeps_numeric_looking_text() {
        let ds = read("code\n007\nA1\n", ',').unwrap();
        let code = ds.column("code").unwrap();
        assert_eq!(code.values[0].as_str(), Some("007"));
    }

    #[test]
    fn duplicate_and_empty_headers_are_renamed() {
        let ds = read("a,a,,a\n1,2,3,4\n", ',').unwrap();
        assert_eq!(ds.column_names(), vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn short_rows_are_padded_with_null() {
        let ds = read("a,b,c\n1,2,3\n4\n", ',').unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.row(1).unwrap(),
            vec![&CellValue::Integer(4), &CellValue::Null, &CellValue::Null]
        );
    }

    #[test]
    fn long_rows_are_a_parse_error() {
        let err = read("a,b\n1,2\n3,4,5\n", ',').unwrap_err();
        match err {
            Error::Parse { message, .. } => {
                assert_eq!(message, "expected 2 fields in line 3, saw 3")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_file_has_no_columns() {
        let err = read("", ',').unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn header_only_file_is_an_empty_table() {
        let ds = read("a,b\n", ',').unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.width(), 2);
    }

    #[test]
    fn quoted_fields_may_contain_the_delimiter() {
        let ds = read("name,note\n\"Doe, J\",\"said \"\"hi\"\"\"\n", ',').unwrap();
        assert_eq!(ds.row(0).unwrap()[0].as_str(), Some("Doe, J"));
        assert_eq!(ds.row(0).unwrap()[1].as_str(), Some("said \"hi\""));
    }

    #[test]
    fn bom_is_not_part_of_the_first_header() {
        let file = file_with(b"\xEF\xBB\xBFa,b\n1,2\n");
        let ds = Importer::new(file.path())
            .read_delimited(&DelimitedOptions::with_delimiter(','))
            .unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let file = file_with(b"a\n\xff\xfe\n");
        for low_memory in [false, true] {
            let options = DelimitedOptions {
                delimiter: ',',
                low_memory,
                ..DelimitedOptions::default()
            };
            let err = Importer::new(file.path()).read_delimited(&options).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "low_memory={low_memory}: {err:?}");
        }
    }

    #[test]
    fn low_memory_yields_the_same_table() {
        let file = file_with(b"x;y\n1;a\n;b\n2.5;c\n");
        let importer = Importer::new(file.path());
        let eager = importer
            .read_delimited(&DelimitedOptions::with_delimiter(';'))
            .unwrap();
        let streamed = importer
            .read_delimited(&DelimitedOptions {
                delimiter: ';',
                low_memory: true,
                encoding: Encoding::Utf8,
            })
            .unwrap();
        assert_eq!(eager, streamed);
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let err = read("a\n", '§').unwrap_err();
        assert!(matches!(err, Error::InvalidDelimiter('§')));
    }

    #[test]
    fn encoding_labels() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf_8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf-8-sig".parse::<Encoding>().unwrap(), Encoding::Utf8Sig);
        let err = "latin-1".parse::<Encoding>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(label) if label == "latin-1"));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: DelimitedOptions =
            serde_json::from_str(r#"{"delimiter": ",", "encoding": "utf8"}"#).unwrap();
        assert_eq!(options, DelimitedOptions::with_delimiter(','));

        let bad = serde_json::from_str::<DelimitedOptions>(r#"{"encoding": "cp1252"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn json_bom_needs_utf8_sig() {
        let file = file_with(b"\xEF\xBB\xBF{\"k\": 1}");
        let importer = Importer::new(file.path());
        assert!(matches!(
            importer.read_json(Encoding::Utf8),
            Err(Error::Parse { .. })
        ));
        assert_eq!(
            importer.read_json(Encoding::Utf8Sig).unwrap(),
            serde_json::json!({"k": 1})
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = file_with(b"{\"k\": [1, 2");
        let err = Importer::new(file.path())
            .read_json(Encoding::Utf8)
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn json_into_typed_value() {
        let file = file_with(br#"["the", "a", "an"]"#);
        let words: Vec<String> = Importer::new(file.path())
            .read_json_as(Encoding::Utf8)
            .unwrap();
        assert_eq!(words, vec!["the", "a", "an"]);
    }
}
