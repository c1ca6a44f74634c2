pub mod app;
pub mod badges;
pub mod calendar;
pub mod checkin;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod signals;
pub mod state;
pub mod storage;
pub mod streak;

pub use app::router;
pub use checkin::{CheckInOutcome, CheckInService};
pub use config::Config;
pub use state::AppState;
pub use storage::Store;
