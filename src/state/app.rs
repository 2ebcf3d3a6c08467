use std::sync::Arc;

use crate::state::kv::KvStore;
use crate::storage::RecordRepository;

/// Shared application state handed to every router.
#[derive(Clone)]
pub struct AppState {
    pub store: KvStore,
    pub records: Arc<dyn RecordRepository>,
}

impl AppState {
    pub fn new(store: KvStore, records: Arc<dyn RecordRepository>) -> Self {
        Self { store, records }
    }
}
