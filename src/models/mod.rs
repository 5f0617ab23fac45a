// Nested-attribute aggregate: payloads, drafts, plans and error trees
pub mod aggregate;
pub mod attributes;
pub mod drafts;
pub mod nested;
pub mod nested_errors;

pub use aggregate::{SaveOutcome, SubmissionAggregate, SubmissionChildren};
pub use attributes::{AttributeSchema, SubmissionAttributes};
pub use nested::SubmissionChanges;
pub use nested_errors::NestedErrors;
