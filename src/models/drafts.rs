use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseTransaction, DbErr, EntityTrait, Set};
use validator::Validate;

use crate::entities::{
    quote_contact, quote_delivery_address, quote_pickup_address, quote_shipment_item,
};
use crate::models::attributes::{
    AddressAttributes, ContactAttributes, Field, ShipmentItemAttributes,
};
use crate::models::nested::{Draft, NestedRecord};

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ContactDraft {
    #[validate(
        required,
        length(max = 255, message = "is too long (maximum is 255 characters)")
    )]
    pub name: Option<String>,
    #[validate(email(message = "is invalid"))]
    pub email: Option<String>,
    #[validate(length(max = 32, message = "is too long (maximum is 32 characters)"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 32, message = "is too long (maximum is 32 characters)"))]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct AddressDraft {
    #[validate(length(max = 255, message = "is too long (maximum is 255 characters)"))]
    pub name: Option<String>,
    #[validate(
        required,
        range(min = -90.0, max = 90.0, message = "must be between -90 and 90")
    )]
    pub lat: Option<f64>,
    #[validate(
        required,
        range(min = -180.0, max = 180.0, message = "must be between -180 and 180")
    )]
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ShipmentItemDraft {
    #[validate(
        required,
        range(min = 0.0, message = "must be greater than or equal to 0")
    )]
    pub width: Option<f64>,
    #[validate(
        required,
        range(min = 0.0, message = "must be greater than or equal to 0")
    )]
    pub length: Option<f64>,
    #[validate(
        required,
        range(min = 0.0, message = "must be greater than or equal to 0")
    )]
    pub height: Option<f64>,
    #[validate(
        required,
        range(min = 0.0, message = "must be greater than or equal to 0")
    )]
    pub weight: Option<f64>,
    #[validate(length(max = 16, message = "is too long (maximum is 16 characters)"))]
    pub weight_unit: Option<String>,
    #[validate(length(max = 16, message = "is too long (maximum is 16 characters)"))]
    pub dimension_unit: Option<String>,
    #[validate(range(min = 1, message = "must be greater than or equal to 1"))]
    pub number_of_item: Option<i32>,
}

fn overlay<T: Clone>(slot: &mut Option<T>, incoming: &Field<T>) {
    if let Some(value) = incoming {
        *slot = value.clone();
    }
}

/// Required columns only reach the store after validation; a missing value
/// is left unset so the NOT NULL constraint reports it instead of a panic.
fn required<T>(value: Option<T>) -> ActiveValue<T>
where
    T: Into<sea_orm::Value>,
{
    value.map(Set).unwrap_or(ActiveValue::NotSet)
}

impl Draft for ContactDraft {
    type Attributes = ContactAttributes;

    fn assign(&mut self, attributes: &ContactAttributes) {
        overlay(&mut self.name, &attributes.name);
        overlay(&mut self.email, &attributes.email);
        overlay(&mut self.phone_number, &attributes.phone_number);
        overlay(&mut self.title, &attributes.title);
    }
}

impl Draft for AddressDraft {
    type Attributes = AddressAttributes;

    fn assign(&mut self, attributes: &AddressAttributes) {
        overlay(&mut self.name, &attributes.name);
        overlay(&mut self.lat, &attributes.lat);
        overlay(&mut self.lon, &attributes.lon);
    }
}

impl Draft for ShipmentItemDraft {
    type Attributes = ShipmentItemAttributes;

    fn assign(&mut self, attributes: &ShipmentItemAttributes) {
        overlay(&mut self.width, &attributes.width);
        overlay(&mut self.length, &attributes.length);
        overlay(&mut self.height, &attributes.height);
        overlay(&mut self.weight, &attributes.weight);
        overlay(&mut self.weight_unit, &attributes.weight_unit);
        overlay(&mut self.dimension_unit, &attributes.dimension_unit);
        overlay(&mut self.number_of_item, &attributes.number_of_item);
    }
}

#[async_trait]
impl NestedRecord for quote_contact::Model {
    type Draft = ContactDraft;

    const ROLE: &'static str = "contact";

    fn id(&self) -> i32 {
        self.id
    }

    fn to_draft(&self) -> ContactDraft {
        ContactDraft {
            name: Some(self.name.clone()),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            title: self.title.clone(),
        }
    }

    async fn insert(
        draft: ContactDraft,
        submission_id: i32,
        txn: &DatabaseTransaction,
    ) -> Result<Self, DbErr> {
        quote_contact::ActiveModel {
            submission_id: Set(submission_id),
            name: required(draft.name),
            email: Set(draft.email),
            phone_number: Set(draft.phone_number),
            title: Set(draft.title),
            ..Default::default()
        }
        .insert(txn)
        .await
    }

    async fn update(self, draft: ContactDraft, txn: &DatabaseTransaction) -> Result<Self, DbErr> {
        let mut contact: quote_contact::ActiveModel = self.into();
        contact.name = required(draft.name);
        contact.email = Set(draft.email);
        contact.phone_number = Set(draft.phone_number);
        contact.title = Set(draft.title);
        contact.update(txn).await
    }

    async fn delete(self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
        quote_contact::Entity::delete_by_id(self.id)
            .exec(txn)
            .await
            .map(|_| ())
    }
}

macro_rules! address_record {
    ($module:ident, $role:literal) => {
        #[async_trait]
        impl NestedRecord for $module::Model {
            type Draft = AddressDraft;

            const ROLE: &'static str = $role;

            fn id(&self) -> i32 {
                self.id
            }

            fn to_draft(&self) -> AddressDraft {
                AddressDraft {
                    name: self.name.clone(),
                    lat: Some(self.lat),
                    lon: Some(self.lon),
                }
            }

            async fn insert(
                draft: AddressDraft,
                submission_id: i32,
                txn: &DatabaseTransaction,
            ) -> Result<Self, DbErr> {
                $module::ActiveModel {
                    submission_id: Set(submission_id),
                    name: Set(draft.name),
                    lat: required(draft.lat),
                    lon: required(draft.lon),
                    ..Default::default()
                }
                .insert(txn)
                .await
            }

            async fn update(
                self,
                draft: AddressDraft,
                txn: &DatabaseTransaction,
            ) -> Result<Self, DbErr> {
                let mut address: $module::ActiveModel = self.into();
                address.name = Set(draft.name);
                address.lat = required(draft.lat);
                address.lon = required(draft.lon);
                address.update(txn).await
            }

            async fn delete(self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
                $module::Entity::delete_by_id(self.id)
                    .exec(txn)
                    .await
                    .map(|_| ())
            }
        }
    };
}

address_record!(quote_pickup_address, "pickup_address");
address_record!(quote_delivery_address, "delivery_address");

#[async_trait]
impl NestedRecord for quote_shipment_item::Model {
    type Draft = ShipmentItemDraft;

    const ROLE: &'static str = "shipment_item";

    fn id(&self) -> i32 {
        self.id
    }

    fn to_draft(&self) -> ShipmentItemDraft {
        ShipmentItemDraft {
            width: Some(self.width),
            length: Some(self.length),
            height: Some(self.height),
            weight: Some(self.weight),
            weight_unit: self.weight_unit.clone(),
            dimension_unit: self.dimension_unit.clone(),
            number_of_item: self.number_of_item,
        }
    }

    async fn insert(
        draft: ShipmentItemDraft,
        submission_id: i32,
        txn: &DatabaseTransaction,
    ) -> Result<Self, DbErr> {
        quote_shipment_item::ActiveModel {
            submission_id: Set(submission_id),
            width: required(draft.width),
            length: required(draft.length),
            height: required(draft.height),
            weight: required(draft.weight),
            weight_unit: Set(draft.weight_unit),
            dimension_unit: Set(draft.dimension_unit),
            number_of_item: Set(draft.number_of_item),
            ..Default::default()
        }
        .insert(txn)
        .await
    }

    async fn update(
        self,
        draft: ShipmentItemDraft,
        txn: &DatabaseTransaction,
    ) -> Result<Self, DbErr> {
        let mut item: quote_shipment_item::ActiveModel = self.into();
        item.width = required(draft.width);
        item.length = required(draft.length);
        item.height = required(draft.height);
        item.weight = required(draft.weight);
        item.weight_unit = Set(draft.weight_unit);
        item.dimension_unit = Set(draft.dimension_unit);
        item.number_of_item = Set(draft.number_of_item);
        item.update(txn).await
    }

    async fn delete(self, txn: &DatabaseTransaction) -> Result<(), DbErr> {
        quote_shipment_item::Entity::delete_by_id(self.id)
            .exec(txn)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::nested_errors::field_errors;
    use rstest::rstest;

    const BLANK: &str = "can't be blank";

    fn item() -> ShipmentItemDraft {
        ShipmentItemDraft {
            width: Some(40.0),
            length: Some(20.0),
            height: Some(35.0),
            weight: Some(30.0),
            weight_unit: Some("kg".into()),
            dimension_unit: Some("cm".into()),
            number_of_item: Some(1),
        }
    }

    #[test]
    fn valid_drafts_have_no_errors() {
        assert!(field_errors(&item()).is_none());
        assert!(field_errors(&AddressDraft {
            name: Some("Wat Phnom".into()),
            lat: Some(11.5659647),
            lon: Some(104.9150842),
        })
        .is_none());
    }

    #[test]
    fn blank_required_field_reports_only_blank() {
        let errors = field_errors(&ShipmentItemDraft {
            width: None,
            ..item()
        })
        .unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors["width"], vec![BLANK.to_string()]);
    }

    #[test]
    fn every_required_field_reports_blank_message() {
        let contact = field_errors(&ContactDraft::default()).unwrap();
        assert_eq!(contact.keys().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(contact["name"], vec![BLANK.to_string()]);

        let address = field_errors(&AddressDraft::default()).unwrap();
        assert_eq!(address["lat"], vec![BLANK.to_string()]);
        assert_eq!(address["lon"], vec![BLANK.to_string()]);

        let item = field_errors(&ShipmentItemDraft::default()).unwrap();
        for field in ["width", "length", "height", "weight"] {
            assert_eq!(item[field], vec![BLANK.to_string()], "{}", field);
        }
        assert_eq!(item.len(), 4);
    }

    #[rstest]
    #[case(AddressDraft { lat: Some(91.0), lon: Some(0.0), name: None }, "lat", "must be between -90 and 90")]
    #[case(AddressDraft { lat: Some(0.0), lon: Some(-180.5), name: None }, "lon", "must be between -180 and 180")]
    #[case(AddressDraft { lat: Some(0.0), lon: None, name: None }, "lon", "can't be blank")]
    fn address_rules(#[case] draft: AddressDraft, #[case] field: &str, #[case] message: &str) {
        let errors = field_errors(&draft).unwrap();
        assert_eq!(errors[field], vec![message.to_string()]);
    }

    #[rstest]
    #[case(ShipmentItemDraft { height: Some(-1.0), ..item() }, "height", "must be greater than or equal to 0")]
    #[case(ShipmentItemDraft { number_of_item: Some(0), ..item() }, "number_of_item", "must be greater than or equal to 1")]
    #[case(ShipmentItemDraft { weight_unit: Some("kilograms-per-unit".into()), ..item() }, "weight_unit", "is too long (maximum is 16 characters)")]
    fn shipment_item_rules(
        #[case] draft: ShipmentItemDraft,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let errors = field_errors(&draft).unwrap();
        assert_eq!(errors[field], vec![message.to_string()]);
    }

    #[test]
    fn contact_email_must_look_like_an_email() {
        let errors = field_errors(&ContactDraft {
            name: Some("Joean".into()),
            email: Some("joeann-at-gmail".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(errors["email"], vec!["is invalid".to_string()]);
        assert!(!errors.contains_key("name"));
    }

    #[test]
    fn assign_overlays_only_present_fields() {
        let attributes: ShipmentItemAttributes =
            serde_json::from_value(serde_json::json!({"width": "20", "weight_unit": null}))
                .unwrap();
        let draft = item().assigned(&attributes);

        assert_eq!(draft.width, Some(20.0));
        assert_eq!(draft.weight_unit, None);
        assert_eq!(draft.dimension_unit.as_deref(), Some("cm"));
        assert_eq!(draft.length, Some(20.0));
    }
}
