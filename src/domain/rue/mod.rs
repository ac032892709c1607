//! Rue (named mapping) domain

mod entity;

pub use entity::{Rue, RueId};
