//! spangraph Index Collections
//!
//! Ordered collections that keep an always-current reverse index.
//!
//! # Overview
//!
//! - **MultiValueIndexMap**: key → sorted set of positions, with range shifting
//! - **IndexedOrderedCollection**: list with duplicates and value → positions lookup
//! - **UniqueIndexedOrderedSet**: duplicate-free list whose positions are dense ids
//!
//! # Example
//!
//! ```rust
//! use spangraph_index::UniqueIndexedOrderedSet;
//!
//! let mut set = UniqueIndexedOrderedSet::new();
//! assert!(set.add("claim"));
//! assert!(set.add("premise"));
//! assert!(!set.add("claim"));
//!
//! set.insert(0, "major-claim").unwrap();
//! assert_eq!(set.index_of("premise"), Some(2));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod list;
pub mod multi_value;
pub mod ordered_set;

// Re-exports
pub use error::IndexError;
pub use list::IndexedOrderedCollection;
pub use multi_value::MultiValueIndexMap;
pub use ordered_set::UniqueIndexedOrderedSet;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for indexed collections
    pub use crate::{IndexError, IndexedOrderedCollection, MultiValueIndexMap, UniqueIndexedOrderedSet};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
