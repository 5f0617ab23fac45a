// Quote submission aggregate
pub mod quote_submissions;

pub use quote_submissions::QuoteSubmissionService;
