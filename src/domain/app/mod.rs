//! Application domain

mod entity;

pub use entity::{App, AppId};
