use std::sync::Arc;

use crate::store::OrderStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
}

impl AppState {
    pub fn new(store: impl OrderStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
