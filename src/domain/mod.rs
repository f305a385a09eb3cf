//! Domain layer: the profile model and the pure value types around it.

pub mod output;
pub mod page;
pub mod profile;
pub mod social;
pub mod validation;
pub mod version;
