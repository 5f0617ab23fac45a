//! Nested-attribute payloads accepted by create and update.
//!
//! Every field is tri-state: absent leaves the stored value alone, `null` or a
//! blank string clears it, anything else sets it. Numbers may arrive as JSON
//! numbers or numeric strings, since form-style clients send `"11.5659647"`.
//! Keys outside the permitted lists are dropped during deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Key form-encoding clients wrap the payload in
pub const ENVELOPE_KEY: &str = "quote_submission";

pub const ADDRESS_FIELDS: [&str; 4] = ["id", "name", "lat", "lon"];
pub const CONTACT_FIELDS: [&str; 5] = ["id", "name", "email", "phone_number", "title"];
pub const SHIPMENT_ITEM_FIELDS: [&str; 8] = [
    "id",
    "width",
    "length",
    "height",
    "weight",
    "weight_unit",
    "dimension_unit",
    "number_of_item",
];

/// `None` = key absent, `Some(None)` = cleared, `Some(Some(v))` = set.
pub type Field<T> = Option<Option<T>>;

/// Common surface of every nested block
pub trait NestedAttributes {
    /// Id of an existing child this block targets
    fn id(&self) -> Option<i32>;
    /// Whether `_destroy` was set
    fn marked_for_destruction(&self) -> bool;
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ContactAttributes {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<i32>,
    #[serde(default, rename = "_destroy", deserialize_with = "lenient::flag")]
    pub destroy: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    #[schema(value_type = Option<String>)]
    pub name: Field<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[schema(value_type = Option<String>)]
    pub email: Field<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[schema(value_type = Option<String>)]
    pub phone_number: Field<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[schema(value_type = Option<String>)]
    pub title: Field<String>,
}

/// Shared by pickup and delivery addresses
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AddressAttributes {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<i32>,
    #[serde(default, rename = "_destroy", deserialize_with = "lenient::flag")]
    pub destroy: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    #[schema(value_type = Option<String>)]
    pub name: Field<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub lat: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub lon: Field<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ShipmentItemAttributes {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<i32>,
    #[serde(default, rename = "_destroy", deserialize_with = "lenient::flag")]
    pub destroy: bool,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub width: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub length: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub height: Field<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[schema(value_type = Option<f64>)]
    pub weight: Field<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[schema(value_type = Option<String>)]
    pub weight_unit: Field<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[schema(value_type = Option<String>)]
    pub dimension_unit: Field<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    #[schema(value_type = Option<i32>)]
    pub number_of_item: Field<i32>,
}

/// Whole create/update payload
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SubmissionAttributes {
    #[serde(default)]
    pub contact_attributes: Option<ContactAttributes>,
    #[serde(default)]
    pub pickup_address_attributes: Option<AddressAttributes>,
    #[serde(default)]
    pub delivery_address_attributes: Option<AddressAttributes>,
    /// Array, or an object keyed by position (`{"0": {...}}`)
    #[serde(default, deserialize_with = "lenient::items")]
    pub shipment_items_attributes: Vec<ShipmentItemAttributes>,
}

impl SubmissionAttributes {
    /// Accepts either `{"quote_submission": {...}}` or the bare inner object.
    pub fn from_body(body: Value) -> Result<Self, serde_json::Error> {
        let inner = match body {
            Value::Object(mut map) => match map.remove(ENVELOPE_KEY) {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };
        serde_json::from_value(inner)
    }
}

macro_rules! nested_attributes {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl NestedAttributes for $ty {
                fn id(&self) -> Option<i32> {
                    self.id
                }

                fn marked_for_destruction(&self) -> bool {
                    self.destroy
                }
            }
        )+
    };
}

nested_attributes!(ContactAttributes, AddressAttributes, ShipmentItemAttributes);

/// Field names each nested block accepts, served by `GET .../new`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttributeSchema {
    #[schema(value_type = Vec<String>)]
    pub pickup_address_attributes: Vec<&'static str>,
    #[schema(value_type = Vec<String>)]
    pub delivery_address_attributes: Vec<&'static str>,
    #[schema(value_type = Vec<String>)]
    pub contact_attributes: Vec<&'static str>,
    #[schema(value_type = Vec<String>)]
    pub shipment_items_attributes: Vec<&'static str>,
}

impl AttributeSchema {
    pub fn permitted() -> Self {
        Self {
            pickup_address_attributes: ADDRESS_FIELDS.to_vec(),
            delivery_address_attributes: ADDRESS_FIELDS.to_vec(),
            contact_attributes: CONTACT_FIELDS.to_vec(),
            shipment_items_attributes: SHIPMENT_ITEM_FIELDS.to_vec(),
        }
    }
}

/// Deserializers that tolerate form-style values
mod lenient {
    use super::ShipmentItemAttributes;
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    fn is_blank(raw: &str) -> bool {
        raw.trim().is_empty()
    }

    fn parse_number(value: Value) -> Result<Option<f64>, String> {
        let parsed = match &value {
            Value::Null => return Ok(None),
            Value::String(raw) if is_blank(raw) => return Ok(None),
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => raw.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|number| number.is_finite())
            .map(Some)
            .ok_or_else(|| format!("expected a number, found {}", value))
    }

    fn parse_integer(value: Value) -> Result<Option<i32>, String> {
        let parsed = match &value {
            Value::Null => return Ok(None),
            Value::String(raw) if is_blank(raw) => return Ok(None),
            Value::Number(number) => number.as_i64().and_then(|n| i32::try_from(n).ok()),
            Value::String(raw) => raw.trim().parse::<i32>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| format!("expected an integer, found {}", value))
    }

    fn parse_text(value: Value) -> Result<Option<String>, String> {
        match value {
            Value::Null => Ok(None),
            Value::String(raw) if is_blank(&raw) => Ok(None),
            Value::String(raw) => Ok(Some(raw)),
            Value::Number(number) => Ok(Some(number.to_string())),
            Value::Bool(flag) => Ok(Some(flag.to_string())),
            other => Err(format!("expected text, found {}", other)),
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_number(Value::deserialize(deserializer)?)
            .map(Some)
            .map_err(D::Error::custom)
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_integer(Value::deserialize(deserializer)?)
            .map(Some)
            .map_err(D::Error::custom)
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_text(Value::deserialize(deserializer)?)
            .map(Some)
            .map_err(D::Error::custom)
    }

    pub fn id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_integer(Value::deserialize(deserializer)?).map_err(D::Error::custom)
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(false),
            Value::Bool(flag) => Ok(flag),
            Value::Number(number) => Ok(number.as_i64() == Some(1)),
            Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" => Ok(true),
                "" | "0" | "false" | "f" => Ok(false),
                other => Err(D::Error::custom(format!(
                    "expected a boolean _destroy flag, found {:?}",
                    other
                ))),
            },
            other => Err(D::Error::custom(format!(
                "expected a boolean _destroy flag, found {}",
                other
            ))),
        }
    }

    pub fn items<'de, D>(deserializer: D) -> Result<Vec<ShipmentItemAttributes>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = match Value::deserialize(deserializer)? {
            Value::Null => Vec::new(),
            Value::Array(entries) => entries,
            Value::Object(map) => {
                let mut keyed = map
                    .into_iter()
                    .map(|(key, entry)| {
                        key.trim()
                            .parse::<usize>()
                            .map(|position| (position, entry))
                            .map_err(|_| {
                                D::Error::custom(format!(
                                    "shipment_items_attributes keys must be positions, found {:?}",
                                    key
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                keyed.sort_by_key(|(position, _)| *position);
                keyed.into_iter().map(|(_, entry)| entry).collect()
            }
            other => {
                return Err(D::Error::custom(format!(
                    "expected a list of shipment items, found {}",
                    other
                )))
            }
        };

        entries
            .into_iter()
            .map(|entry| serde_json::from_value(entry).map_err(D::Error::custom))
            .collect()
    }
}
