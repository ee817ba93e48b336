use super::canonical::ParamSet;
use super::signature;
use crate::core::{AppError, Result};

/// Authenticate a returned parameter set.
///
/// `signature_fields[0]` carries the provider digest; every listed field is
/// removed before the remainder is re-encoded and checked. On success the
/// stripped, now-trusted set is returned.
pub fn verify_signed_params(
    params: &ParamSet,
    secret: &str,
    signature_fields: &[&str],
) -> Result<ParamSet> {
    let signature_field = signature_fields
        .first()
        .ok_or_else(|| AppError::internal("No signature field configured"))?;

    let supplied = params
        .get(signature_field)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            AppError::signature_mismatch(format!("Callback is missing '{}'", signature_field))
        })?;

    let stripped = params.without(signature_fields);
    let canonical = stripped.canonical_string();

    if !signature::verify(&canonical, secret, supplied) {
        return Err(AppError::signature_mismatch(format!(
            "'{}' does not match the recomputed digest",
            signature_field
        )));
    }

    Ok(stripped)
}
