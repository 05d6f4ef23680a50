//! Admission (§4.3): per-kind validators and defaulters invoked before
//! persistence. Modeled as pure Rust functions rather than HTTP webhooks,
//! since the control-plane API server is an external collaborator this
//! crate does not implement -- handlers and tests call these directly
//! before handing an object to the scoped client / object store.

pub mod rules;

use crate::errors::{Error, FieldError, Result};

/// Rejects with `Error::Invalid` if `errors` is non-empty, matching §4.3's
/// "an invalid object is rejected with `Error::Invalid(kind, name, field_errors)`".
pub fn reject_if_invalid(kind: &str, name: &str, errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::invalid(kind, name, errors).into())
    }
}
