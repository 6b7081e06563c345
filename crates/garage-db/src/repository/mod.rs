//! # Repository Module
//!
//! ```text
//! GarageStore ──► db.cache() ──► CacheRepository ──► cache_snapshots
//!                                 ├── write(key, &collection)
//!                                 ├── read(key) / read_list(key)
//!                                 └── entries(), remove(key), clear()
//! ```
//!
//! ## Available Repositories
//!
//! - [`cache::CacheRepository`] - Whole-collection snapshots by key

pub mod cache;
