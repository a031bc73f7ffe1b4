pub mod attribute;
pub mod descriptor;
pub mod events;
pub mod instance;

pub use attribute::Attribute;
pub use descriptor::ModelDescriptor;
pub use events::{EventHandlers, Hook, HookResult, ModelEvent};
pub use instance::{Model, Related};
