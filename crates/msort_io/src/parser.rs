//! Parser for word-list files.
//!
//! The format is line oriented:
//!
//! ```text
//! # reference workload
//! 2999
//! 0x0BB6
//! 1_000
//! ```

use anyhow::{Result, anyhow};
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while1};
use nom::combinator::{all_consuming, map_res};
use nom::sequence::preceded;

fn digits(input: &str, radix: u32) -> Result<u64, core::num::ParseIntError> {
    u64::from_str_radix(&input.replace('_', ""), radix)
}

fn hex_word(input: &str) -> IResult<&str, u64> {
    map_res(
        preceded(
            tag_no_case("0x"),
            take_while1(|c: char| c.is_ascii_hexdigit() || c == '_'),
        ),
        |d: &str| digits(d, 16),
    )(input)
}

fn dec_word(input: &str) -> IResult<&str, u64> {
    map_res(
        take_while1(|c: char| c.is_ascii_digit() || c == '_'),
        |d: &str| digits(d, 10),
    )(input)
}

/// Parses a single word, decimal or `0x` hexadecimal.
pub fn word(input: &str) -> IResult<&str, u64> {
    alt((hex_word, dec_word))(input)
}

/// Parses a whole word-list file.
///
/// # Returns
///
/// The words in file order, or an error naming the first bad line
/// (1-based).
pub fn parse_words(text: &str) -> Result<Vec<u64>> {
    let mut words = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let (_, value) = all_consuming(word)(content)
            .map_err(|_| anyhow!("line {}: '{}' is not a 64-bit word", idx + 1, content))?;
        words.push(value);
    }

    Ok(words)
}

/// Formats words in the layout [`parse_words`] reads back.
pub fn format_words(words: &[u64]) -> String {
    let mut out = String::with_capacity(words.len() * 8);
    for w in words {
        out.push_str(&w.to_string());
        out.push('\n');
    }
    out
}
