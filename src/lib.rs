//! # pathcache
//!
//! Path representation, fingerprinting and MRU caching for path-aware
//! multipath networks.
//!
//! A destination is usually reachable over several disjoint forwarding paths,
//! each encoded as a segment-based hop-field header. This crate provides:
//!
//! - decoding of that header into the interfaces a packet traverses
//! - structure-derived fingerprints that survive metadata refreshes
//! - a bounded, per-destination most-recently-used path cache fed by an
//!   external path source
//!
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Connection establishment (caller)              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │        PathCache::select / PathCache::record (per-dst lock)     │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │ 1-ff00:0:110 │  │ 1-ff00:0:111 │  │ 2-ff00:0:220 │  ...      │
//! │  │  PathsMru    │  │  PathsMru    │  │  PathsMru    │           │
//! │  └──────────────┘  └──────────────┘  └──────────────┘           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │         Path = ForwardingPath + PathMetadata + Fingerprint      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                 PathSource (external path service)              │
//! └─────────────────────────────────────────────────────────────────┘

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow stylistic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]      // Many functions can't be const due to trait bounds
#![allow(clippy::doc_markdown)]              // ASCII diagrams in docs
#![allow(clippy::unreadable_literal)]        // Numeric literals are clear
#![allow(clippy::cast_possible_truncation)]  // Bit-field extraction
#![allow(clippy::significant_drop_tightening)] // Lock scopes are intentional
#![allow(clippy::option_if_let_else)]        // More readable in context
#![allow(clippy::use_self)]                  // Explicit type names in matches
#![allow(clippy::redundant_pub_crate)]       // Explicit visibility
#![allow(clippy::match_same_arms)]           // Explicit arm per variant is clearer
#![allow(clippy::return_self_not_must_use)]  // Builder methods don't need must_use

pub mod cache;
pub mod config;
pub mod error;
pub mod path;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use cache::{CacheConfig, PathCache, PathSource, PathsMru, StaticPathSource};
pub use config::Config;
pub use error::{Error, Result};
pub use path::{decode_hops, Fingerprint, ForwardingPath, Path, PathMetadata};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{CacheConfig, PathCache, PathSource, PathsMru};
    pub use crate::error::{Error, Result};
    pub use crate::path::{decode_hops, Fingerprint, ForwardingPath, Path, PathMetadata};
    pub use crate::types::*;
}
