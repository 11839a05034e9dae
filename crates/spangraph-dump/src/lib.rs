//! spangraph Dump Writers
//!
//! Egress for annotated documents: JSON dumps and debug text listings.
//!
//! # Targets
//!
//! - **Stdout**: one `{id: document}` object
//! - **File**: one `{id: document}` object in a file
//! - **Directory**: one `<id>.json` per document
//!
//! # Example
//!
//! ```rust,no_run
//! use spangraph_core::{GraphConfig, RawSpan};
//! use spangraph_dump::{DocumentDump, DumpConfig, DumpTarget};
//!
//! # async fn example() -> Result<(), spangraph_dump::DumpError> {
//! let config = DumpConfig::new().with_target(DumpTarget::Directory("out".into()));
//! let mut dump = DocumentDump::new(config);
//!
//! dump.add_raw(
//!     "essay01",
//!     "Cats rule.",
//!     vec![RawSpan::new(0, 10, "Claim", "Cats rule.")],
//!     &[],
//!     &GraphConfig::default(),
//! )?;
//!
//! dump.write().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod debug;
pub mod error;
pub mod json;

// Re-exports
pub use config::{DumpConfig, DumpTarget};
pub use debug::{append_debug, render_debug, DebugOptions};
pub use error::{DumpError, DumpResult};
pub use json::DocumentDump;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
