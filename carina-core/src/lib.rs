//! Carina Core
//!
//! Core library for an infrastructure management tool that treats side effects as values.
//! Providers implement the [`provider::Provider`] contract against the types defined here.

pub mod differ;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod timeouts;
