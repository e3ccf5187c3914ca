//! Glossary for the term-of-the-day post

use std::path::Path;

use crate::error::Result;
use crate::model::Term;

pub const DEFAULT_TERMS_PATH: &str = "crypto_terms.json";

/// Single entry used when the term file is missing or unreadable
pub fn fallback_terms() -> Vec<Term> {
    vec![Term {
        term: "Blockchain".to_string(),
        definition: "A decentralized ledger.".to_string(),
    }]
}

/// Parse a JSON array of `{ "term", "definition" }` objects
pub fn read_terms(path: &Path) -> Result<Vec<Term>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Load terms from `path`, falling back to [`fallback_terms`] on any error or
/// an empty list.
pub fn load_terms(path: &Path) -> Vec<Term> {
    match read_terms(path) {
        Ok(terms) if !terms.is_empty() => {
            tracing::info!(path = %path.display(), count = terms.len(), "Loaded crypto terms");
            terms
        }
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Term file is empty, using fallback");
            fallback_terms()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not load terms, using fallback");
            fallback_terms()
        }
    }
}
