pub mod quote_submission;

pub use quote_submission::SubmissionResponse;
