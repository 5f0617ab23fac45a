use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};

use crate::{
    entities::{
        quote_contact, quote_delivery_address, quote_pickup_address, quote_shipment_item,
        quote_submission, SubmissionStatus,
    },
    errors::ServiceError,
    models::{
        AttributeSchema, SaveOutcome, SubmissionAggregate, SubmissionAttributes,
        SubmissionChanges, SubmissionChildren,
    },
};

fn not_found(id: i32) -> ServiceError {
    ServiceError::NotFound(format!("quote submission {}", id))
}

/// Repository over the quote submission aggregate. Every write runs in a
/// single transaction and children are validated before anything is written.
#[derive(Clone)]
pub struct QuoteSubmissionService {
    db: Arc<DatabaseConnection>,
}

impl QuoteSubmissionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// One page of submissions ordered by id. `page` is 1-based and no count
    /// query is issued.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<Vec<SubmissionAggregate>, ServiceError> {
        let db = &*self.db;
        let per_page = per_page.max(1);
        let page_index = page.max(1) - 1;
        // Offsets past i64 cannot address any row.
        let addressable = page_index
            .checked_mul(per_page)
            .is_some_and(|offset| i64::try_from(offset).is_ok());
        if !addressable {
            return Ok(Vec::new());
        }

        let submissions = quote_submission::Entity::find()
            .order_by_asc(quote_submission::Column::Id)
            .paginate(db, per_page)
            .fetch_page(page_index)
            .await?;

        Ok(load_aggregates(db, submissions).await?)
    }

    #[instrument(skip(self))]
    pub async fn find(&self, id: i32) -> Result<SubmissionAggregate, ServiceError> {
        load_aggregate(&*self.db, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Field names accepted by create and update
    pub fn attribute_schema(&self) -> AttributeSchema {
        AttributeSchema::permitted()
    }

    #[instrument(skip(self, attributes))]
    pub async fn create(
        &self,
        attributes: SubmissionAttributes,
    ) -> Result<SaveOutcome, ServiceError> {
        let changes = SubmissionChanges::plan(SubmissionChildren::default(), &attributes)?;
        let errors = changes.errors();
        if !errors.is_empty() {
            warn!(failing_roles = errors.len(), "Quote submission rejected");
            return Ok(SaveOutcome::Invalid(errors));
        }

        let txn = self.db.begin().await?;
        let submission = quote_submission::ActiveModel {
            status: Set(SubmissionStatus::Open),
            shipment_items_count: Set(0),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let children = changes.persist(submission.id, &txn).await?;
        let submission = store_item_count(submission, children.shipment_items.len(), &txn).await?;
        txn.commit().await?;

        info!(
            submission_id = submission.id,
            items = submission.shipment_items_count,
            "Quote submission created"
        );
        self.find(submission.id).await.map(SaveOutcome::Saved)
    }

    #[instrument(skip(self, attributes))]
    pub async fn update(
        &self,
        id: i32,
        attributes: SubmissionAttributes,
    ) -> Result<SaveOutcome, ServiceError> {
        let txn = self.db.begin().await?;
        let (submission, children) = load_aggregate(&txn, id)
            .await?
            .ok_or_else(|| not_found(id))?
            .split();

        let changes = SubmissionChanges::plan(children, &attributes)?;
        let errors = changes.errors();
        if !errors.is_empty() {
            txn.rollback().await?;
            warn!(
                submission_id = id,
                failing_roles = errors.len(),
                "Quote submission update rejected"
            );
            return Ok(SaveOutcome::Invalid(errors));
        }

        if changes.changes_anything() {
            let items = changes.item_count();
            changes.persist(id, &txn).await?;
            store_item_count(submission, items, &txn).await?;
            info!(submission_id = id, items, "Quote submission updated");
        }
        txn.commit().await?;

        self.find(id).await.map(SaveOutcome::Saved)
    }

    /// Removes the submission with every child and returns what was deleted.
    #[instrument(skip(self))]
    pub async fn destroy(&self, id: i32) -> Result<SubmissionAggregate, ServiceError> {
        let txn = self.db.begin().await?;
        let snapshot = load_aggregate(&txn, id)
            .await?
            .ok_or_else(|| not_found(id))?;

        quote_shipment_item::Entity::delete_many()
            .filter(quote_shipment_item::Column::SubmissionId.eq(id))
            .exec(&txn)
            .await?;
        quote_contact::Entity::delete_many()
            .filter(quote_contact::Column::SubmissionId.eq(id))
            .exec(&txn)
            .await?;
        quote_pickup_address::Entity::delete_many()
            .filter(quote_pickup_address::Column::SubmissionId.eq(id))
            .exec(&txn)
            .await?;
        quote_delivery_address::Entity::delete_many()
            .filter(quote_delivery_address::Column::SubmissionId.eq(id))
            .exec(&txn)
            .await?;
        quote_submission::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            submission_id = id,
            items = snapshot.shipment_items.len(),
            "Quote submission destroyed"
        );
        Ok(snapshot)
    }
}

/// Writes the item count and touches `updated_at`.
async fn store_item_count<C: ConnectionTrait>(
    submission: quote_submission::Model,
    items: usize,
    conn: &C,
) -> Result<quote_submission::Model, DbErr> {
    let count = i32::try_from(items)
        .map_err(|_| DbErr::Custom(format!("shipment item count {} out of range", items)))?;
    let mut active: quote_submission::ActiveModel = submission.into();
    active.shipment_items_count = Set(count);
    active.update(conn).await
}

async fn load_aggregate<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<SubmissionAggregate>, DbErr> {
    let Some(submission) = quote_submission::Entity::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };
    Ok(load_aggregates(conn, vec![submission]).await?.pop())
}

/// Attaches children to a batch of submissions with one query per child
/// table.
async fn load_aggregates<C: ConnectionTrait>(
    conn: &C,
    submissions: Vec<quote_submission::Model>,
) -> Result<Vec<SubmissionAggregate>, DbErr> {
    if submissions.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = submissions.iter().map(|submission| submission.id).collect();

    let mut contacts: HashMap<i32, quote_contact::Model> = quote_contact::Entity::find()
        .filter(quote_contact::Column::SubmissionId.is_in(ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|contact| (contact.submission_id, contact))
        .collect();

    let mut pickups: HashMap<i32, quote_pickup_address::Model> =
        quote_pickup_address::Entity::find()
            .filter(quote_pickup_address::Column::SubmissionId.is_in(ids.clone()))
            .all(conn)
            .await?
            .into_iter()
            .map(|address| (address.submission_id, address))
            .collect();

    let mut deliveries: HashMap<i32, quote_delivery_address::Model> =
        quote_delivery_address::Entity::find()
            .filter(quote_delivery_address::Column::SubmissionId.is_in(ids.clone()))
            .all(conn)
            .await?
            .into_iter()
            .map(|address| (address.submission_id, address))
            .collect();

    let mut items: HashMap<i32, Vec<quote_shipment_item::Model>> = HashMap::new();
    for item in quote_shipment_item::Entity::find()
        .filter(quote_shipment_item::Column::SubmissionId.is_in(ids))
        .order_by_asc(quote_shipment_item::Column::Id)
        .all(conn)
        .await?
    {
        items.entry(item.submission_id).or_default().push(item);
    }

    Ok(submissions
        .into_iter()
        .map(|submission| {
            let id = submission.id;
            SubmissionChildren {
                contact: contacts.remove(&id),
                pickup_address: pickups.remove(&id),
                delivery_address: deliveries.remove(&id),
                shipment_items: items.remove(&id).unwrap_or_default(),
            }
            .attach(submission)
        })
        .collect())
}
