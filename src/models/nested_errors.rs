//! Sparse error tree reported when nested attributes fail validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

/// Field name to its messages, e.g. `{"name": ["can't be blank"]}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Per-role validation errors. Roles that validated cleanly are left out
/// entirely, so a valid aggregate produces an empty tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NestedErrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub contact: Option<FieldErrors>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub pickup_address: Option<FieldErrors>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub delivery_address: Option<FieldErrors>,

    /// Keyed by the item's position in the submission's item sequence
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schema(value_type = Object)]
    pub shipment_items: BTreeMap<usize, FieldErrors>,
}

impl NestedErrors {
    pub fn is_empty(&self) -> bool {
        self.contact.is_none()
            && self.pickup_address.is_none()
            && self.delivery_address.is_none()
            && self.shipment_items.is_empty()
    }

    /// Number of roles (counting each failing item) that carry errors
    pub fn len(&self) -> usize {
        [&self.contact, &self.pickup_address, &self.delivery_address]
            .iter()
            .filter(|role| role.is_some())
            .count()
            + self.shipment_items.len()
    }
}

/// Validates one child and flattens the result into `FieldErrors`.
/// Returns `None` when the child is valid.
pub fn field_errors<T: Validate>(child: &T) -> Option<FieldErrors> {
    child.validate().err().map(|errors| flatten(&errors))
}

/// Message for the `required` validator, which takes no message of its own
pub const BLANK_MESSAGE: &str = "can't be blank";

fn message_for(failure: &ValidationError) -> String {
    match (&failure.message, failure.code.as_ref()) {
        (Some(message), _) => message.to_string(),
        (None, "required") => BLANK_MESSAGE.to_string(),
        (None, code) => code.to_string(),
    }
}

fn flatten(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, failures)| {
            let messages = failures.iter().map(message_for).collect();
            (field.to_string(), messages)
        })
        .collect()
}
