//! Core XML tokenizing primitives
//!
//! This module contains the building blocks of the push tokenizer:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: incremental, well-formedness checking token engine
//! - Encoding: BOM / declaration sniffing and incremental UTF-8 conversion
//! - Entities: reference decoding and newline normalization
//! - Attributes: start-tag attribute scanning into spans
//! - DTD: internal-subset entity declarations
//! - Position: line/column tracking

pub mod attributes;
pub mod dtd;
pub mod encoding;
pub mod entities;
pub mod error;
pub mod position;
pub mod scanner;
pub mod span;
pub mod tokenizer;

pub use error::{SyntaxError, SyntaxErrorCode};
pub use position::Position;
pub use tokenizer::{Phase, ScanHandler, Tokenizer};
