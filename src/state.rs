use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::RetryPolicy,
    services::order_number::{EntropyOrderNumbers, OrderNumberGenerator},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub retry: RetryPolicy,
    pub order_numbers: Arc<dyn OrderNumberGenerator>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self {
            orm,
            retry,
            order_numbers: Arc::new(EntropyOrderNumbers),
        }
    }

    /// Swap the order number source, mostly for tests that need collisions.
    pub fn with_order_numbers(mut self, generator: impl OrderNumberGenerator + 'static) -> Self {
        self.order_numbers = Arc::new(generator);
        self
    }
}
