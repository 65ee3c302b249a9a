//! Document number and item code generation
//!
//! Format: `<PREFIX>-<YYMMDD>-<XXXX>`, e.g. `SAL-240315-7QKD` or
//! `ITM-240315-K2P9`. Uniqueness is enforced by the store; a collision
//! surfaces as `DuplicateDocument` (transactions) or `Conflict` (items).

use chrono::{NaiveDate, Utc};
use rand::Rng;
use shared::TransactionKind;

const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;

/// Prefix of generated item codes
pub const ITEM_CODE_PREFIX: &str = "ITM";

/// Source of document numbers for new transactions
pub trait DocumentNumberSource: Send + Sync {
    fn next_number(&self, kind: TransactionKind) -> String;
}

/// Generates human-readable transaction identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentNumberGenerator;

impl DocumentNumberGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a number dated today (UTC)
    pub fn generate(&self, kind: TransactionKind) -> String {
        self.generate_on(kind, Utc::now().date_naive())
    }

    /// Generate a number for a specific date
    pub fn generate_on(&self, kind: TransactionKind, date: NaiveDate) -> String {
        format_document_number(kind.document_prefix(), date, &random_suffix())
    }

    /// Generate an item code dated today (UTC)
    pub fn generate_item_code(&self) -> String {
        format_document_number(ITEM_CODE_PREFIX, Utc::now().date_naive(), &random_suffix())
    }
}

impl DocumentNumberSource for DocumentNumberGenerator {
    fn next_number(&self, kind: TransactionKind) -> String {
        self.generate(kind)
    }
}

pub fn format_document_number(prefix: &str, date: NaiveDate, suffix: &str) -> String {
    format!("{}-{}-{}", prefix, date.format("%y%m%d"), suffix)
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}
