pub mod builder;
pub mod model_builder;
pub mod stack;

pub use builder::QueryBuilder;
pub use model_builder::ModelBuilder;
pub use stack::{Call, CallStack, IntoArgs};
