//! Entity services built on the generic storage layer

mod app_service;
mod rue_service;
mod shared_secret_service;

pub use app_service::AppService;
pub use rue_service::RueService;
pub use shared_secret_service::SharedSecretService;
