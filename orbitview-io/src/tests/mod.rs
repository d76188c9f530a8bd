//! Cross-format tests for the io crate
