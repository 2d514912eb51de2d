use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use filekit::{Exporter, ensure_directory};

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "that", "the", "to", "was", "with",
];

/// Minimal deterministic PRNG (splitmix64), enough for reproducible noise.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [-1, 1).
    fn noise(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }
}

fn measurements_tsv(rng: &mut SplitMix) -> (String, usize) {
    let samples = [("Sample_A", 0.8), ("Sample_B", 0.6), ("Sample_C", 0.9)];
    let concentrations = [0.1, 0.5, 1.0, 2.0, 5.0];
    let operators = ["Alice", "Bob"];

    let mut out = String::from("measurement_id\tsample\tconcentration\toperator\tabsorbance\n");
    let mut row_id = 0;
    for (sample, slope) in samples {
        for conc in concentrations {
            for operator in operators {
                let absorbance = slope * conc + 0.01 * rng.noise();
                // writing to a String cannot fail
                let _ = writeln!(
                    out,
                    "{row_id}\t{sample}\t{conc}\t{operator}\t{absorbance:.5}"
                );
                row_id += 1;
            }
        }
    }
    (out, row_id)
}

fn main() -> Result<()> {
    env_logger::init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("samples"));
    ensure_directory(&dir).with_context(|| format!("preparing {}", dir.display()))?;

    let mut rng = SplitMix(42);
    let (table, rows) = measurements_tsv(&mut rng);
    let table_path = dir.join("measurements.tsv");
    Exporter::new(&table_path)
        .write_text(&table)
        .context("writing measurements")?;

    let words_path = dir.join("stop_words.json");
    Exporter::new(&words_path)
        .write_json(STOP_WORDS)
        .context("writing stop words")?;

    Exporter::new(dir.join("generate.log"))
        .append_text(&format!(
            "wrote {rows} rows to {} and {} stop words to {}\n",
            table_path.display(),
            STOP_WORDS.len(),
            words_path.display()
        ))
        .context("appending run log")?;

    println!("Wrote {rows} measurements and {} stop words to {}", STOP_WORDS.len(), dir.display());
    Ok(())
}
