pub mod app;
pub mod chat;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod stats;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::Settings;
pub use ledger::Ledger;
pub use models::AppData;
pub use state::AppState;
