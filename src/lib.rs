// ============================================================================
// restorm Library
// ============================================================================

//! Client-side fluent query builder over REST.
//!
//! Chained query-builder calls are recorded into an ordered stack,
//! shipped to a REST backend as a single JSON `query` parameter, and
//! the JSON rows that come back are hydrated into attribute-map model
//! instances. The backend is the only party that interprets the stack.
//!
//! # Examples
//!
//! ```no_run
//! use restorm::{ConnectionConfig, ModelDescriptor, Registry};
//!
//! # tokio_test::block_on(async {
//! let registry = Registry::connect(ConnectionConfig::new("https://example.com"))?;
//!
//! registry.define("Post", ModelDescriptor::new("api/posts").dates(["published_at"]))?;
//!
//! let posts = registry.named("Post")?;
//! let recent = posts
//!     .where_(("votes", ">", 100))
//!     .order_by("published_at")
//!     .get(None)
//!     .await?;
//!
//! for post in &recent {
//!     println!("{:?}", post.attribute("title"));
//! }
//! # restorm::Result::Ok(())
//! # }).unwrap();
//! ```

pub mod connection;
pub mod core;
pub mod model;
pub mod prelude;
pub mod query;
pub mod registry;

// Re-export main types for convenience
pub use crate::core::{Error, Result};
pub use connection::{ConnectionConfig, RestConnection, Transport};
pub use model::{Hook, HookResult, Model, ModelDescriptor, ModelEvent, Related};
pub use query::{Call, CallStack, IntoArgs, ModelBuilder, QueryBuilder};
pub use registry::{ModelType, Registry};
