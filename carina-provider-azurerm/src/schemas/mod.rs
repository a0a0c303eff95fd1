//! Azure resource schema definitions

pub mod appservice;
pub mod securitycenter;
pub mod types;
