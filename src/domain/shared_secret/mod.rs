//! Shared secret domain

mod entity;

pub use entity::{SharedSecret, SharedSecretId};
