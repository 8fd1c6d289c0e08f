use crate::parser::{format_words, parse_words};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Loads a word-list file.
pub fn load_words<P: AsRef<Path>>(path: P) -> Result<Vec<u64>> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open word list {}", path.display()))?;
    let mut text = String::new();
    file.read_to_string(&mut text)?;

    parse_words(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Writes `words` to a word-list file, replacing any existing file.
pub fn save_words<P: AsRef<Path>>(path: P, words: &[u64]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create word list {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(format_words(words).as_bytes())?;
    out.flush()?;
    Ok(())
}
