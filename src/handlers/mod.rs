pub mod health;
pub mod quote_submissions;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::services::QuoteSubmissionService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub quote_submissions: Arc<QuoteSubmissionService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            quote_submissions: Arc::new(QuoteSubmissionService::new(db)),
        }
    }
}
