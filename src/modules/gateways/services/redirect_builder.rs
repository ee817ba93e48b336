use super::canonical::{encode_component, ParamSet};
use super::signature;
use crate::core::{AppError, Result};

/// Sign a finished parameter set and turn it into `base_url?query`.
///
/// The signature field is appended after the canonical query so the signed
/// payload is exactly the set the provider will strip it from.
pub fn build_signed_url(
    base_url: &str,
    params: &ParamSet,
    secret: &str,
    signature_field: &str,
) -> Result<String> {
    if params.contains_key(signature_field) {
        return Err(AppError::internal(format!(
            "Parameter set already contains '{}'",
            signature_field
        )));
    }

    let canonical = params.canonical_string();
    let digest = signature::sign(&canonical, secret)?;

    let separator = if base_url.contains('?') { '&' } else { '?' };

    Ok(format!(
        "{}{}{}&{}={}",
        base_url,
        separator,
        canonical,
        encode_component(signature_field),
        digest
    ))
}
