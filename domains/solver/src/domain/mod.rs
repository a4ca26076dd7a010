//! Domain layer for the kata solver
//!
//! Contains the conversation value objects and aggregate, plus the
//! audit-facing exchange history model.

pub mod entities;
pub mod history;

use kata_common::{Error, Result};

/// Reject empty or whitespace-only text
pub(crate) fn require_text(text: &str, what: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{} cannot be empty", what)));
    }
    Ok(())
}
