pub mod quote_contact;
pub mod quote_delivery_address;
pub mod quote_pickup_address;
pub mod quote_shipment_item;
pub mod quote_submission;

pub use quote_submission::SubmissionStatus;
