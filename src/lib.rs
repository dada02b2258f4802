//! Record service for engineering intents and goals.
//!
//! The [`db`] module owns persistence: repositories for each resource, the
//! predicate builder behind filtered listings and tag-set normalization.
//! [`api`] is a thin HTTP layer that validates input and maps repository
//! failures to status codes.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
