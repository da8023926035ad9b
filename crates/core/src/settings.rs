//! Well-known settings keys and value validation.

use crate::error::CoreError;

/// JSON array of headphone model names used by the classifier.
pub const HEADPHONE_MODELS_KEY: &str = "headphone_models";

/// Storefront connection options shown on the settings screen.
pub const SHOPIFY_CONFIG_KEY: &str = "shopify_config";

/// Maximum length of a settings key.
pub const MAX_KEY_LEN: usize = 100;

pub fn validate_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(CoreError::Validation(format!(
            "Setting key must be 1-{MAX_KEY_LEN} characters"
        )));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(CoreError::Validation(
            "Setting key may only contain lowercase letters, digits and underscores".to_string(),
        ));
    }
    Ok(())
}

/// Parse the `headphone_models` value: a JSON array of non-empty strings.
pub fn parse_headphone_models(value: &serde_json::Value) -> Result<Vec<String>, CoreError> {
    let items = value.as_array().ok_or_else(|| {
        CoreError::Validation("headphone_models must be an array of strings".to_string())
    })?;

    items
        .iter()
        .map(|item| match item.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(CoreError::Validation(
                "headphone_models entries must be non-empty strings".to_string(),
            )),
        })
        .collect()
}

/// Validate a value before it is written under `key`.
pub fn validate_setting(key: &str, value: &serde_json::Value) -> Result<(), CoreError> {
    validate_key(key)?;
    if key == HEADPHONE_MODELS_KEY {
        parse_headphone_models(value)?;
    }
    Ok(())
}
