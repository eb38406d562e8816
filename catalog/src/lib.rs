//! Quarry Catalog
//!
//! Administrative access to the coordinator catalog:
//! - Creating, checking, listing and dropping databases
//! - Listing, describing and dropping tables

mod admin;

pub use admin::CatalogAdminClient;
