//! Production request bookkeeping.
//!
//! A production request asks for `quantity_requested` units of a product.
//! Workers log finished units against it; the request is fulfilled once the
//! completed count reaches the requested count.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionRequestStatus {
    Open,
    Fulfilled,
    Cancelled,
}

impl ProductionRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "open" => Ok(Self::Open),
            "fulfilled" => Ok(Self::Fulfilled),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown production request status: '{other}'"
            ))),
        }
    }
}

pub fn validate_new_request(product_name: &str, quantity_requested: i32) -> Result<(), CoreError> {
    if product_name.trim().is_empty() {
        return Err(CoreError::Validation("product_name is required".to_string()));
    }
    if quantity_requested <= 0 {
        return Err(CoreError::Validation(
            "quantity_requested must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Check that `quantity` units may be logged against a request in `status`.
pub fn validate_log_quantity(
    status: ProductionRequestStatus,
    quantity: i32,
) -> Result<(), CoreError> {
    if quantity <= 0 {
        return Err(CoreError::Validation("quantity must be positive".to_string()));
    }
    match status {
        ProductionRequestStatus::Open => Ok(()),
        other => Err(CoreError::Conflict(format!(
            "Cannot log production against a {} request",
            other.as_str()
        ))),
    }
}

/// Status after the completed count becomes `completed`.
pub fn status_after_log(completed: i32, requested: i32) -> ProductionRequestStatus {
    if completed >= requested {
        ProductionRequestStatus::Fulfilled
    } else {
        ProductionRequestStatus::Open
    }
}
