//! Core XML parsing components
//!
//! - scanner: memchr-accelerated byte scanning
//! - entities: entity decoding and output escaping
//! - attributes: start-tag attribute parsing
//! - tokenizer: pull tokenizer with well-formedness checks

pub mod attributes;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
