//! civic: render a résumé profile through an HTML template into HTML or PDF.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
