//! Plans how a nested-attribute payload changes a submission's children.
//!
//! Planning is pure: it reads the loaded children and the payload and decides,
//! per child, whether to keep, update, create or destroy it. Nothing touches
//! the store until every live child has validated, and then `persist` applies
//! the whole plan inside the caller's transaction.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbErr};
use validator::Validate;

use crate::entities::{
    quote_contact, quote_delivery_address, quote_pickup_address, quote_shipment_item,
};
use crate::errors::ServiceError;
use crate::models::aggregate::SubmissionChildren;
use crate::models::attributes::{NestedAttributes, SubmissionAttributes};
use crate::models::nested_errors::{field_errors, FieldErrors, NestedErrors};

/// In-memory field set for one child, validated before any write.
pub trait Draft: Validate + Clone + Default + std::fmt::Debug + Send + Sync {
    type Attributes: NestedAttributes + std::fmt::Debug + Sync;

    /// Overlays the fields present in `attributes`.
    fn assign(&mut self, attributes: &Self::Attributes);

    fn assigned(mut self, attributes: &Self::Attributes) -> Self {
        self.assign(attributes);
        self
    }
}

/// A persisted child row that nested attributes can target.
#[async_trait]
pub trait NestedRecord: Clone + std::fmt::Debug + Send + Sync + Sized {
    type Draft: Draft;

    /// Role name used in error messages
    const ROLE: &'static str;

    fn id(&self) -> i32;

    fn to_draft(&self) -> Self::Draft;

    async fn insert(
        draft: Self::Draft,
        submission_id: i32,
        txn: &DatabaseTransaction,
    ) -> Result<Self, DbErr>;

    async fn update(self, draft: Self::Draft, txn: &DatabaseTransaction) -> Result<Self, DbErr>;

    async fn delete(self, txn: &DatabaseTransaction) -> Result<(), DbErr>;
}

type AttributesOf<R> = <<R as NestedRecord>::Draft as Draft>::Attributes;

fn missing_child<R: NestedRecord>(id: i32) -> ServiceError {
    ServiceError::NotFound(format!(
        "{} {} does not belong to this quote submission",
        R::ROLE,
        id
    ))
}

/// What happens to one child when the plan is persisted.
#[derive(Debug, Clone)]
pub enum ChildPlan<R: NestedRecord> {
    Keep(R),
    Update { record: R, draft: R::Draft },
    Create(R::Draft),
    Destroy(R),
}

impl<R: NestedRecord> ChildPlan<R> {
    fn record(&self) -> Option<&R> {
        match self {
            Self::Keep(record) | Self::Destroy(record) | Self::Update { record, .. } => {
                Some(record)
            }
            Self::Create(_) => None,
        }
    }

    fn targets(&self, id: i32) -> bool {
        self.record().map(|record| record.id() == id).unwrap_or(false)
    }

    /// Whether the child still exists once the plan is applied
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Destroy(_))
    }

    /// Applies a block that named this child by id. A destroy mark sticks
    /// even when a later block names the same child again.
    fn apply(self, attributes: &AttributesOf<R>) -> Self {
        let (record, draft) = match self {
            Self::Keep(record) => {
                let draft = record.to_draft();
                (record, draft)
            }
            Self::Update { record, draft } => (record, draft),
            settled @ (Self::Create(_) | Self::Destroy(_)) => return settled,
        };

        if attributes.marked_for_destruction() {
            Self::Destroy(record)
        } else {
            Self::Update {
                record,
                draft: draft.assigned(attributes),
            }
        }
    }

    pub fn errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Keep(record) => field_errors(&record.to_draft()),
            Self::Update { draft, .. } | Self::Create(draft) => field_errors(draft),
            Self::Destroy(_) => None,
        }
    }

    async fn persist(
        self,
        submission_id: i32,
        txn: &DatabaseTransaction,
    ) -> Result<Option<R>, DbErr> {
        match self {
            Self::Keep(record) => Ok(Some(record)),
            Self::Update { record, draft } => record.update(draft, txn).await.map(Some),
            Self::Create(draft) => R::insert(draft, submission_id, txn).await.map(Some),
            Self::Destroy(record) => record.delete(txn).await.map(|_| None),
        }
    }
}

/// Plan for a singular role (contact, pickup and delivery address).
#[derive(Debug, Clone)]
pub struct OnePlan<R: NestedRecord> {
    pub current: Option<ChildPlan<R>>,
    /// Previous child displaced by a block without an id
    pub replaced: Option<R>,
}

impl<R: NestedRecord> OnePlan<R> {
    pub fn new(
        existing: Option<R>,
        attributes: Option<&AttributesOf<R>>,
    ) -> Result<Self, ServiceError> {
        let Some(attributes) = attributes else {
            return Ok(Self {
                current: existing.map(ChildPlan::Keep),
                replaced: None,
            });
        };

        match (attributes.id(), existing) {
            (Some(id), Some(record)) if record.id() == id => Ok(Self {
                current: Some(ChildPlan::Keep(record).apply(attributes)),
                replaced: None,
            }),
            (Some(id), _) => Err(missing_child::<R>(id)),
            (None, existing) if attributes.marked_for_destruction() => Ok(Self {
                current: existing.map(ChildPlan::Keep),
                replaced: None,
            }),
            (None, existing) => Ok(Self {
                current: Some(ChildPlan::Create(R::Draft::default().assigned(attributes))),
                replaced: existing,
            }),
        }
    }

    pub fn errors(&self) -> Option<FieldErrors> {
        self.current.as_ref().and_then(ChildPlan::errors)
    }

    fn changes_anything(&self) -> bool {
        self.replaced.is_some() || !matches!(self.current, None | Some(ChildPlan::Keep(_)))
    }

    async fn persist(
        self,
        submission_id: i32,
        txn: &DatabaseTransaction,
    ) -> Result<Option<R>, DbErr> {
        // The old row goes first: each singular role is unique per submission.
        if let Some(previous) = self.replaced {
            previous.delete(txn).await?;
        }
        match self.current {
            Some(plan) => plan.persist(submission_id, txn).await,
            None => Ok(None),
        }
    }
}

/// Plans the ordered shipment item sequence. Existing items keep their
/// positions (including ones marked for destruction) and new items follow in
/// payload order.
pub fn plan_many<R: NestedRecord>(
    existing: Vec<R>,
    blocks: &[AttributesOf<R>],
) -> Result<Vec<ChildPlan<R>>, ServiceError> {
    blocks
        .iter()
        .try_fold(
            existing.into_iter().map(ChildPlan::Keep).collect::<Vec<_>>(),
            |mut plans, block| {
                match block.id() {
                    Some(id) => {
                        let position = plans
                            .iter()
                            .position(|plan| plan.targets(id))
                            .ok_or_else(|| missing_child::<R>(id))?;
                        let planned = plans.remove(position).apply(block);
                        plans.insert(position, planned);
                    }
                    None if block.marked_for_destruction() => {}
                    None => plans.push(ChildPlan::Create(R::Draft::default().assigned(block))),
                }
                Ok::<_, ServiceError>(plans)
            },
        )
}

/// Every change a payload makes to one submission.
#[derive(Debug, Clone)]
pub struct SubmissionChanges {
    pub contact: OnePlan<quote_contact::Model>,
    pub pickup_address: OnePlan<quote_pickup_address::Model>,
    pub delivery_address: OnePlan<quote_delivery_address::Model>,
    pub shipment_items: Vec<ChildPlan<quote_shipment_item::Model>>,
}

impl SubmissionChanges {
    pub fn plan(
        existing: SubmissionChildren,
        attributes: &SubmissionAttributes,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            contact: OnePlan::new(existing.contact, attributes.contact_attributes.as_ref())?,
            pickup_address: OnePlan::new(
                existing.pickup_address,
                attributes.pickup_address_attributes.as_ref(),
            )?,
            delivery_address: OnePlan::new(
                existing.delivery_address,
                attributes.delivery_address_attributes.as_ref(),
            )?,
            shipment_items: plan_many(
                existing.shipment_items,
                &attributes.shipment_items_attributes,
            )?,
        })
    }

    /// Sparse error tree over every live child
    pub fn errors(&self) -> NestedErrors {
        NestedErrors {
            contact: self.contact.errors(),
            pickup_address: self.pickup_address.errors(),
            delivery_address: self.delivery_address.errors(),
            shipment_items: self
                .shipment_items
                .iter()
                .enumerate()
                .filter_map(|(position, plan)| plan.errors().map(|errors| (position, errors)))
                .collect(),
        }
    }

    /// Shipment items remaining after the plan is applied
    pub fn item_count(&self) -> usize {
        self.shipment_items
            .iter()
            .filter(|plan| plan.is_live())
            .count()
    }

    pub fn changes_anything(&self) -> bool {
        self.contact.changes_anything()
            || self.pickup_address.changes_anything()
            || self.delivery_address.changes_anything()
            || self
                .shipment_items
                .iter()
                .any(|plan| !matches!(plan, ChildPlan::Keep(_)))
    }

    pub async fn persist(
        self,
        submission_id: i32,
        txn: &DatabaseTransaction,
    ) -> Result<SubmissionChildren, DbErr> {
        let contact = self.contact.persist(submission_id, txn).await?;
        let pickup_address = self.pickup_address.persist(submission_id, txn).await?;
        let delivery_address = self.delivery_address.persist(submission_id, txn).await?;

        let mut shipment_items = Vec::with_capacity(self.shipment_items.len());
        for plan in self.shipment_items {
            if let Some(item) = plan.persist(submission_id, txn).await? {
                shipment_items.push(item);
            }
        }

        Ok(SubmissionChildren {
            contact,
            pickup_address,
            delivery_address,
            shipment_items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attributes::{AddressAttributes, ContactAttributes, ShipmentItemAttributes};
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;

    fn contact(id: i32, name: &str) -> quote_contact::Model {
        quote_contact::Model {
            id,
            submission_id: 1,
            name: name.to_string(),
            email: None,
            phone_number: None,
            title: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(id: i32, width: f64) -> quote_shipment_item::Model {
        quote_shipment_item::Model {
            id,
            submission_id: 1,
            width,
            length: 1.0,
            height: 1.0,
            weight: 1.0,
            weight_unit: Some("kg".into()),
            dimension_unit: Some("cm".into()),
            number_of_item: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn contact_block(raw: serde_json::Value) -> ContactAttributes {
        serde_json::from_value(raw).unwrap()
    }

    fn item_blocks(raw: serde_json::Value) -> Vec<ShipmentItemAttributes> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn absent_block_keeps_existing_child() {
        let plan = OnePlan::new(Some(contact(4, "Joean")), None).unwrap();
        assert_matches!(plan.current, Some(ChildPlan::Keep(ref record)) if record.id == 4);
        assert!(!plan.changes_anything());
    }

    #[test]
    fn block_with_matching_id_updates_in_place() {
        let block = contact_block(json!({"id": 4, "name": "Jhone"}));
        let plan = OnePlan::new(Some(contact(4, "Joean")), Some(&block)).unwrap();

        assert!(plan.replaced.is_none());
        assert_matches!(
            plan.current,
            Some(ChildPlan::Update { ref record, ref draft })
                if record.id == 4 && draft.name.as_deref() == Some("Jhone")
        );
    }

    #[test]
    fn block_without_id_replaces_singular_child() {
        let block = contact_block(json!({"name": "Jhone"}));
        let plan = OnePlan::new(Some(contact(4, "Joean")), Some(&block)).unwrap();

        assert_matches!(plan.replaced, Some(ref old) if old.id == 4);
        assert_matches!(plan.current, Some(ChildPlan::Create(_)));
    }

    #[test]
    fn foreign_id_is_not_found() {
        let block = contact_block(json!({"id": 99, "name": "Jhone"}));
        let result = OnePlan::new(Some(contact(4, "Joean")), Some(&block));
        assert_matches!(result, Err(ServiceError::NotFound(_)));
    }

    #[test]
    fn destroy_flag_on_new_block_is_ignored() {
        let block: AddressAttributes =
            serde_json::from_value(json!({"_destroy": "1", "lat": 1, "lon": 2})).unwrap();
        let plan = OnePlan::<quote_pickup_address::Model>::new(None, Some(&block)).unwrap();
        assert!(plan.current.is_none());
    }

    #[test]
    fn destroying_singular_child_clears_its_errors() {
        let block = contact_block(json!({"id": 4, "_destroy": true, "name": null}));
        let plan = OnePlan::new(Some(contact(4, "Joean")), Some(&block)).unwrap();

        assert_matches!(plan.current, Some(ChildPlan::Destroy(_)));
        assert!(plan.errors().is_none());
    }

    #[test]
    fn items_update_append_and_destroy_by_position() {
        let blocks = item_blocks(json!([
            {"id": 11, "_destroy": "1"},
            {"id": 12, "width": 99},
            {"width": 5, "length": 5, "height": 5, "weight": 5}
        ]));
        let plans = plan_many(vec![item(11, 1.0), item(12, 2.0)], &blocks).unwrap();

        assert_eq!(plans.len(), 3);
        assert_matches!(plans[0], ChildPlan::Destroy(ref record) if record.id == 11);
        assert_matches!(
            plans[1],
            ChildPlan::Update { ref draft, .. } if draft.width == Some(99.0)
        );
        assert_matches!(plans[2], ChildPlan::Create(_));
    }

    #[test]
    fn destroy_mark_survives_a_repeated_id() {
        let blocks = item_blocks(json!([
            {"id": 11, "_destroy": "1"},
            {"id": 11, "width": 3}
        ]));
        let plans = plan_many(vec![item(11, 1.0), item(12, 2.0)], &blocks).unwrap();

        assert_matches!(plans[0], ChildPlan::Destroy(ref record) if record.id == 11);
        assert_matches!(plans[1], ChildPlan::Keep(ref record) if record.id == 12);
    }

    #[test]
    fn unknown_item_id_is_not_found() {
        let blocks = item_blocks(json!([{"id": 77, "width": 1}]));
        assert_matches!(
            plan_many(vec![item(11, 1.0)], &blocks),
            Err(ServiceError::NotFound(_))
        );
    }

    #[test]
    fn error_tree_indexes_items_by_position() {
        let attributes = SubmissionAttributes::from_body(json!({
            "contact_attributes": {"name": null},
            "delivery_address_attributes": {"lat": null, "lon": "106.9775092"},
            "shipment_items_attributes": [
                {"width": null, "length": 20, "height": 35, "weight": 30},
                {"width": 10, "length": null, "height": 20, "weight": 30}
            ]
        }))
        .unwrap();

        let changes = SubmissionChanges::plan(SubmissionChildren::default(), &attributes).unwrap();
        let tree = serde_json::to_value(changes.errors()).unwrap();

        assert_eq!(
            tree,
            json!({
                "contact": {"name": ["can't be blank"]},
                "delivery_address": {"lat": ["can't be blank"]},
                "shipment_items": {
                    "0": {"width": ["can't be blank"]},
                    "1": {"length": ["can't be blank"]}
                }
            })
        );
    }

    #[test]
    fn destroyed_items_keep_their_position() {
        let children = SubmissionChildren {
            shipment_items: vec![item(11, 1.0), item(12, 2.0)],
            ..Default::default()
        };
        let attributes = SubmissionAttributes::from_body(json!({
            "shipment_items_attributes": [
                {"id": 11, "_destroy": true},
                {"width": 3}
            ]
        }))
        .unwrap();

        let changes = SubmissionChanges::plan(children, &attributes).unwrap();
        let errors = changes.errors();

        assert_eq!(changes.item_count(), 2);
        assert!(changes.changes_anything());
        assert_eq!(errors.shipment_items.keys().copied().collect::<Vec<_>>(), vec![2]);
    }
}
