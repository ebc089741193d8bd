use crate::models::AppData;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to the single ledger; every mutation holds the lock for the
/// whole update so readers only ever see completed mutations.
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data: AppData) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }
}
