use std::collections::HashMap;
use std::sync::Arc;

use crate::model::events::{EventHandlers, HookResult, ModelEvent};
use crate::model::instance::Model;

/// Class-level metadata for a registered model.
///
/// Composed once at registration time with the builder methods below and
/// frozen behind an `Arc` when the model boots; instances and builders
/// only ever read it. This replaces the original's
/// extend-a-class-at-runtime registration with a plain configuration
/// value.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    /// REST endpoint, relative to the connection's base URL
    pub endpoint: String,

    /// Primary key column, `id` unless overridden
    pub primary_key: String,

    /// Columns coerced to date attributes, in addition to the implicit
    /// `created_at`/`updated_at`/`deleted_at` timestamps
    pub dates: Vec<String>,

    /// Named server-side query scopes this model declares
    pub scopes: Vec<String>,

    /// Relation attribute name -> registered model name
    pub relations: HashMap<String, String>,

    /// Lifecycle hooks, ordered per event
    pub events: EventHandlers,
}

const IMPLICIT_DATES: [&str; 3] = ["created_at", "updated_at", "deleted_at"];

impl ModelDescriptor {
    pub fn new(endpoint: &str) -> Self {
        Self::default().endpoint(endpoint)
    }

    /// Set the endpoint
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Override the primary key column
    pub fn primary_key(mut self, key: &str) -> Self {
        self.primary_key = key.to_string();
        self
    }

    /// Declare a date column
    pub fn date(mut self, column: &str) -> Self {
        self.dates.push(column.to_string());
        self
    }

    /// Declare several date columns
    pub fn dates<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.dates.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Declare a named scope
    pub fn scope(mut self, name: &str) -> Self {
        self.scopes.push(name.to_string());
        self
    }

    /// Declare several named scopes
    pub fn scopes<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.scopes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Map a relation attribute to the related model's registered name
    pub fn relation(mut self, attribute: &str, model_name: &str) -> Self {
        self.relations
            .insert(attribute.to_string(), model_name.to_string());
        self
    }

    /// Register a lifecycle hook
    pub fn on<F>(mut self, event: ModelEvent, hook: F) -> Self
    where
        F: Fn(&mut Model) -> HookResult + Send + Sync + 'static,
    {
        self.events.register(event, Arc::new(hook));
        self
    }

    pub fn is_date(&self, column: &str) -> bool {
        self.dates.iter().any(|d| d == column) || IMPLICIT_DATES.contains(&column)
    }

    pub fn is_relation(&self, attribute: &str) -> bool {
        self.relations.contains_key(attribute)
    }

    pub fn related_model(&self, attribute: &str) -> Option<&str> {
        self.relations.get(attribute).map(String::as_str)
    }
}

impl Default for ModelDescriptor {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            primary_key: "id".to_string(),
            dates: Vec::new(),
            scopes: Vec::new(),
            relations: HashMap::new(),
            events: EventHandlers::new(),
        }
    }
}

macro_rules! event_registrars {
    ($( ($method:ident, $event:ident) ),* $(,)?) => {
        impl ModelDescriptor {
            $(
                #[doc = concat!("Register a `", stringify!($method), "` hook.")]
                pub fn $method<F>(self, hook: F) -> Self
                where
                    F: Fn(&mut Model) -> HookResult + Send + Sync + 'static,
                {
                    self.on(ModelEvent::$event, hook)
                }
            )*
        }
    };
}

event_registrars! {
    (creating, Creating),
    (created, Created),
    (updating, Updating),
    (updated, Updated),
    (saving, Saving),
    (saved, Saved),
    (deleting, Deleting),
    (deleted, Deleted),
}
