//! Application services: generation, init, schema export, the release check
//! and the template pipeline.

pub mod error;
pub mod generate;
pub mod init;
pub mod release;
pub mod schema;
pub mod template;
