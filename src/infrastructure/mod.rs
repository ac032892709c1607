//! Infrastructure layer - Concrete implementations over the domain traits

pub mod api_key;
pub mod logging;
pub mod services;
pub mod storage;
