use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    quote_contact, quote_delivery_address, quote_pickup_address, quote_shipment_item,
    SubmissionStatus,
};
use crate::models::SubmissionAggregate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContactResponse {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AddressResponse {
    pub id: i32,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShipmentItemResponse {
    pub id: i32,
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub weight: f64,
    pub weight_unit: Option<String>,
    pub dimension_unit: Option<String>,
    pub number_of_item: Option<i32>,
}

/// A quote submission with its children inlined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "status": "open",
    "shipment_items_count": 1,
    "contact": {"id": 1, "name": "Joean", "email": "joeann@gmail.com", "phone_number": "0972223334", "title": null},
    "pickup_address": {"id": 1, "name": "Wat Phnom", "lat": 11.5659647, "lon": 104.9150842},
    "delivery_address": {"id": 1, "name": "Sen Monorom", "lat": 12.4589157, "lon": 106.9775092},
    "shipment_items": [{"id": 1, "width": 40.0, "length": 20.0, "height": 35.0, "weight": 30.0, "weight_unit": "kg", "dimension_unit": "cm", "number_of_item": 1}],
    "created_at": "2024-12-09T10:30:00Z",
    "updated_at": "2024-12-09T10:30:00Z"
}))]
pub struct SubmissionResponse {
    pub id: i32,
    pub status: SubmissionStatus,
    pub shipment_items_count: i32,
    pub contact: Option<ContactResponse>,
    pub pickup_address: Option<AddressResponse>,
    pub delivery_address: Option<AddressResponse>,
    pub shipment_items: Vec<ShipmentItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&quote_contact::Model> for ContactResponse {
    fn from(contact: &quote_contact::Model) -> Self {
        Self {
            id: contact.id,
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone_number: contact.phone_number.clone(),
            title: contact.title.clone(),
        }
    }
}

impl From<&quote_pickup_address::Model> for AddressResponse {
    fn from(address: &quote_pickup_address::Model) -> Self {
        Self {
            id: address.id,
            name: address.name.clone(),
            lat: address.lat,
            lon: address.lon,
        }
    }
}

impl From<&quote_delivery_address::Model> for AddressResponse {
    fn from(address: &quote_delivery_address::Model) -> Self {
        Self {
            id: address.id,
            name: address.name.clone(),
            lat: address.lat,
            lon: address.lon,
        }
    }
}

impl From<&quote_shipment_item::Model> for ShipmentItemResponse {
    fn from(item: &quote_shipment_item::Model) -> Self {
        Self {
            id: item.id,
            width: item.width,
            length: item.length,
            height: item.height,
            weight: item.weight,
            weight_unit: item.weight_unit.clone(),
            dimension_unit: item.dimension_unit.clone(),
            number_of_item: item.number_of_item,
        }
    }
}

impl From<&SubmissionAggregate> for SubmissionResponse {
    fn from(aggregate: &SubmissionAggregate) -> Self {
        let submission = &aggregate.submission;
        Self {
            id: submission.id,
            status: submission.status,
            shipment_items_count: submission.shipment_items_count,
            contact: aggregate.contact.as_ref().map(ContactResponse::from),
            pickup_address: aggregate.pickup_address.as_ref().map(AddressResponse::from),
            delivery_address: aggregate.delivery_address.as_ref().map(AddressResponse::from),
            shipment_items: aggregate
                .shipment_items
                .iter()
                .map(ShipmentItemResponse::from)
                .collect(),
            created_at: submission.created_at,
            updated_at: submission.updated_at,
        }
    }
}

impl From<SubmissionAggregate> for SubmissionResponse {
    fn from(aggregate: SubmissionAggregate) -> Self {
        Self::from(&aggregate)
    }
}
