use crate::entities::{
    quote_contact, quote_delivery_address, quote_pickup_address, quote_shipment_item,
    quote_submission,
};

/// A submission together with every child it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionAggregate {
    pub submission: quote_submission::Model,
    pub contact: Option<quote_contact::Model>,
    pub pickup_address: Option<quote_pickup_address::Model>,
    pub delivery_address: Option<quote_delivery_address::Model>,
    /// Ordered by id, which is insertion order
    pub shipment_items: Vec<quote_shipment_item::Model>,
}

/// The owned children without their root
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionChildren {
    pub contact: Option<quote_contact::Model>,
    pub pickup_address: Option<quote_pickup_address::Model>,
    pub delivery_address: Option<quote_delivery_address::Model>,
    pub shipment_items: Vec<quote_shipment_item::Model>,
}

impl SubmissionAggregate {
    pub fn id(&self) -> i32 {
        self.submission.id
    }

    pub fn split(self) -> (quote_submission::Model, SubmissionChildren) {
        (
            self.submission,
            SubmissionChildren {
                contact: self.contact,
                pickup_address: self.pickup_address,
                delivery_address: self.delivery_address,
                shipment_items: self.shipment_items,
            },
        )
    }
}

impl SubmissionChildren {
    pub fn attach(self, submission: quote_submission::Model) -> SubmissionAggregate {
        SubmissionAggregate {
            submission,
            contact: self.contact,
            pickup_address: self.pickup_address,
            delivery_address: self.delivery_address,
            shipment_items: self.shipment_items,
        }
    }
}

/// Result of a create or update: the saved aggregate, or the reasons it was
/// not saved.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Saved(SubmissionAggregate),
    Invalid(crate::models::nested_errors::NestedErrors),
}
