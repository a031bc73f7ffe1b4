use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::core::{Error, Result};
use crate::model::attribute::Attribute;
use crate::model::events::{HookResult, ModelEvent};
use crate::query::ModelBuilder;
use crate::registry::ModelType;

/// A related record (or records) hydrated from a relation attribute.
#[derive(Debug, Clone)]
pub enum Related {
    One(Box<Model>),
    Many(Vec<Model>),
}

/// A single record of a registered model.
///
/// Holds the attribute map, an `original` snapshot for dirty-diffing, and
/// the `exists` flag tracking the instance's lifecycle: new
/// (`exists = false`) until a save succeeds, persisted until a delete
/// succeeds, after which saving again re-inserts.
#[derive(Debug, Clone)]
pub struct Model {
    model: ModelType,
    attributes: BTreeMap<String, Attribute>,
    relations: BTreeMap<String, Related>,
    original: BTreeMap<String, Attribute>,
    exists: bool,
}

impl Model {
    pub(crate) fn new(model: ModelType, attributes: Value, exists: bool) -> Result<Self> {
        let mut instance = Self {
            model,
            attributes: BTreeMap::new(),
            relations: BTreeMap::new(),
            original: BTreeMap::new(),
            exists,
        };

        instance.fill(attributes)?;
        instance.sync_original();

        Ok(instance)
    }

    /// The registered name of this model's type.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Fill attributes from a JSON object. Non-objects are ignored.
    pub fn fill(&mut self, attributes: Value) -> Result<&mut Self> {
        if let Value::Object(map) = attributes {
            for (key, value) in map {
                self.set_attribute(&key, value)?;
            }
        }

        Ok(self)
    }

    /// Set a single attribute.
    ///
    /// Declared date columns are coerced into date attributes; declared
    /// relation attributes are hydrated into instances of the related
    /// model and held apart from the plain attributes.
    pub fn set_attribute(&mut self, key: &str, mut value: Value) -> Result<&mut Self> {
        if let Some(related_name) = self.model.descriptor().related_model(key) {
            let related_type = self.model.registry().named(related_name)?;

            match value {
                Value::Null => {
                    self.relations.remove(key);
                    return Ok(self);
                }
                Value::Array(rows) => {
                    let many = rows
                        .into_iter()
                        .map(|row| related_type.hydrate_row(row))
                        .collect::<Result<Vec<_>>>()?;
                    self.relations.insert(key.to_string(), Related::Many(many));
                    return Ok(self);
                }
                row @ Value::Object(_) => {
                    let one = related_type.hydrate_row(row)?;
                    self.relations
                        .insert(key.to_string(), Related::One(Box::new(one)));
                    return Ok(self);
                }
                // A scalar under a relation name is not a relation
                // payload; keep it as a plain attribute.
                other => value = other,
            }
        }

        let is_date = self.model.descriptor().is_date(key);
        self.attributes
            .insert(key.to_string(), Attribute::from_wire(value, is_date));

        Ok(self)
    }

    /// A single attribute in its wire form.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes.get(key).map(Attribute::to_wire)
    }

    /// A date attribute as a timestamp.
    pub fn date_attribute(&self, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        self.attributes.get(key).and_then(Attribute::as_date)
    }

    /// A hydrated relation, when one has been loaded or filled.
    pub fn relation(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    /// Snapshot of the attributes. Relations are excluded, and the clone
    /// guarantees mutating the snapshot never touches the live instance.
    pub fn attributes(&self) -> BTreeMap<String, Attribute> {
        self.attributes.clone()
    }

    /// The wire form of all attributes, dates as integer timestamps.
    pub fn to_wire(&self) -> Value {
        let map: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(key, attr)| (key.clone(), attr.to_wire()))
            .collect();

        Value::Object(map)
    }

    /// Attributes changed since the last sync point (construction or the
    /// most recent successful save). Dates compare by timestamp.
    pub fn dirty(&self) -> BTreeMap<String, Attribute> {
        self.attributes
            .iter()
            .filter(|(key, attr)| self.original.get(*key) != Some(attr))
            .map(|(key, attr)| (key.clone(), attr.clone()))
            .collect()
    }

    fn dirty_wire(&self) -> Value {
        let map: Map<String, Value> = self
            .dirty()
            .iter()
            .map(|(key, attr)| (key.clone(), attr.to_wire()))
            .collect();

        Value::Object(map)
    }

    /// The primary key column name.
    pub fn key_name(&self) -> &str {
        &self.model.descriptor().primary_key
    }

    /// The primary key value, when set.
    pub fn key(&self) -> Option<Value> {
        self.attribute(self.key_name()).filter(|v| !v.is_null())
    }

    /// Open a fresh query bound to this instance.
    pub fn new_query(&self) -> ModelBuilder {
        self.model.query().bind_key(self.key())
    }

    /// Persist the instance.
    ///
    /// Fires `saving`, then either the insert path (`creating` -> POST ->
    /// `created`) or the update path (`updating` -> PUT of the dirty set
    /// -> `updated`) depending on `exists`. On success the server response
    /// is filled back in and the original snapshot re-syncs. A `Cancel`
    /// from any "before" hook rejects without touching the network.
    pub async fn save(&mut self) -> Result<()> {
        if self.fire(ModelEvent::Saving) == HookResult::Cancel {
            return Err(Error::cancelled(ModelEvent::Saving.name()));
        }

        let response = if self.exists {
            self.perform_update().await?
        } else {
            self.perform_insert().await?
        };

        self.exists = true;
        self.fire(ModelEvent::Saved);

        if response.is_object() {
            self.fill(response)?;
        }
        self.sync_original();

        Ok(())
    }

    async fn perform_insert(&mut self) -> Result<Value> {
        if self.fire(ModelEvent::Creating) == HookResult::Cancel {
            return Err(Error::cancelled(ModelEvent::Creating.name()));
        }

        let values = self.to_wire();
        let response = self.new_query().insert(&values).await?;

        self.fire(ModelEvent::Created);
        Ok(response)
    }

    async fn perform_update(&mut self) -> Result<Value> {
        if self.fire(ModelEvent::Updating) == HookResult::Cancel {
            return Err(Error::cancelled(ModelEvent::Updating.name()));
        }

        let values = self.dirty_wire();
        let response = self.new_query().update(&values).await?;

        self.fire(ModelEvent::Updated);
        Ok(response)
    }

    /// Update attributes and persist.
    ///
    /// On an instance that doesn't exist yet this is a shortcut to a bulk
    /// update on the query builder instead.
    pub async fn update(&mut self, attributes: Value) -> Result<()> {
        if !self.exists {
            self.new_query().update(&attributes).await?;
            return Ok(());
        }

        self.fill(attributes)?;
        self.save().await
    }

    /// Delete the record.
    ///
    /// Fires `deleting` (cancellable), then issues a DELETE scoped to
    /// `where(primary_key, key)`. On success `exists` drops to false and
    /// `deleted` fires; the instance can be saved again afterwards, which
    /// re-inserts it.
    pub async fn delete(&mut self) -> Result<bool> {
        if self.fire(ModelEvent::Deleting) == HookResult::Cancel {
            return Err(Error::cancelled(ModelEvent::Deleting.name()));
        }

        let key = self.key().ok_or_else(|| {
            Error::Configuration("cannot delete a model without a primary key value".into())
        })?;
        let key_name = self.key_name().to_string();

        let success = self.new_query().where_((key_name, key)).delete().await?;

        if success {
            self.exists = false;
        }
        self.fire(ModelEvent::Deleted);

        Ok(success)
    }

    /// Eager-load relations onto this instance.
    ///
    /// Runs `with(relations).first()` on a fresh query and copies only the
    /// requested relations back, so attribute edits made while the load
    /// was in flight are preserved.
    pub async fn load(&mut self, relations: &[&str]) -> Result<&mut Self> {
        let found = self.model.query().with(relations).first(None).await?;

        if let Some(found) = found {
            for name in relations {
                if let Some(related) = found.relations.get(*name) {
                    self.relations.insert((*name).to_string(), related.clone());
                }
            }
        }

        Ok(self)
    }

    /// Re-capture the original snapshot from the current attributes.
    pub(crate) fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    fn fire(&mut self, event: ModelEvent) -> HookResult {
        // Clone the Arc so the handler list isn't borrowed from self
        // while hooks take &mut self.
        let descriptor = Arc::clone(self.model.descriptor_arc());
        descriptor.events.fire(event, self)
    }
}
