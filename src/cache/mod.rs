//! Bounded in-memory caching for hot entities.
//!
//! This module provides a fixed-capacity, least-recently-used cache keyed by
//! entity id. It is a non-authoritative acceleration of the durable store and
//! can always be fully reconstructed from it.

mod bounded;

pub use bounded::BoundedCache;
