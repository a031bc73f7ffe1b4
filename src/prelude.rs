//! Everything an application needs to define and query models.
//!
//! ```
//! use restorm::prelude::*;
//! ```

pub use crate::connection::{ConnectionConfig, RestConnection, Transport};
pub use crate::core::{Error, Result};
pub use crate::model::{Hook, HookResult, Model, ModelDescriptor, ModelEvent, Related};
pub use crate::query::{CallStack, IntoArgs, ModelBuilder, QueryBuilder};
pub use crate::registry::{ModelType, Registry};
