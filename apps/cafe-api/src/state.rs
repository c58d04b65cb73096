//! # Application State
//!
//! Shared state handed to every handler through axum's `State` extractor.
//! Cloning is cheap: the database handle wraps a pool and the rest sits
//! behind `Arc`.

use std::sync::Arc;

use cafe_core::{BillFormatter, CurrencyFormat, PricingCalculator};
use cafe_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub pricing: PricingCalculator,
    pub bill: Arc<BillFormatter>,
    pub currency: Arc<CurrencyFormat>,
    pub receipt_width: usize,
    /// `None` disables bearer token checks.
    pub jwt: Option<Arc<JwtManager>>,
}

impl AppState {
    /// Wires the calculators and formatters from configuration.
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        AppState {
            db,
            pricing: PricingCalculator::new(config.surcharge),
            bill: Arc::new(BillFormatter::new(config.store.clone())),
            currency: Arc::new(config.currency.clone()),
            receipt_width: config.receipt_width,
            jwt: config
                .jwt_secret
                .as_ref()
                .map(|secret| Arc::new(JwtManager::new(secret.clone()))),
        }
    }
}
