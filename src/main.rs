use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use filekit::{DelimitedOptions, Encoding, Importer, TabularDataset};

const PREVIEW_ROWS: usize = 5;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .context("usage: filekit <file> [delimiter]")?;
    let delimiter = args.next();

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let importer = Importer::new(&path);

    if ext == "json" {
        let doc = importer
            .read_json(Encoding::Utf8)
            .with_context(|| format!("loading {}", path.display()))?;
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let delimiter = match delimiter.as_deref() {
        Some("\\t") | Some("tab") => '\t',
        Some(d) => {
            let mut chars = d.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => bail!("delimiter must be a single character, got {d:?}"),
            }
        }
        None if ext == "csv" => ',',
        None => '\t',
    };
    let dataset = importer
        .read_delimited(&DelimitedOptions::with_delimiter(delimiter))
        .with_context(|| format!("loading {}", path.display()))?;
    print_summary(&dataset);
    Ok(())
}

fn print_summary(dataset: &TabularDataset) {
    println!("{} rows x {} columns", dataset.len(), dataset.width());
    for column in dataset.columns() {
        println!("  {:<24} {}", column.name, column.dtype);
    }
    if dataset.is_empty() {
        return;
    }

    println!();
    println!("{}", dataset.column_names().join("\t"));
    for row in dataset.rows().take(PREVIEW_ROWS) {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        println!("{}", cells.join("\t"));
    }
    if dataset.len() > PREVIEW_ROWS {
        println!("... {} more rows", dataset.len() - PREVIEW_ROWS);
    }
}
