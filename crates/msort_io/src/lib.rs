//! I/O utilities for sort workload files.
//!
//! Provides reading and writing of word-list files, the plain-text format
//! the host tools use to store sort inputs and results.

/// File loading and saving for word-list files.
///
/// Handles file I/O and attaches the file path to any error so CLI users
/// see which input was rejected.
pub mod loader;

/// Parser for the word-list format.
///
/// One unsigned 64-bit word per line, decimal or `0x`-prefixed hexadecimal,
/// with optional `_` digit separators. Blank lines and `#` comments are
/// ignored.
pub mod parser;
