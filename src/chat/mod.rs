//! Chat domain: entities, their wire mapping, the remote client, and the
//! offline repository.

pub mod api_types;
pub mod client;
pub mod repository;
pub mod types;
