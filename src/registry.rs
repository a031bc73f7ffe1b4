use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::connection::{ConnectionConfig, RestConnection, Transport};
use crate::core::{Error, Result};
use crate::model::{Model, ModelDescriptor};
use crate::query::{IntoArgs, ModelBuilder};

/// Process-scoped registry of model definitions.
///
/// Models are registered by name with a [`ModelDescriptor`] and
/// constructed lazily: the [`ModelType`] for a name is "booted" on the
/// first `named()` lookup and memoized for the life of the registry.
/// Registering the same name twice is an explicit error rather than a
/// silent overwrite. Cheap to clone; clones share the same state.
///
/// Typical lifecycle: build one registry per backend at startup, `define`
/// every model, then hand clones out to whatever needs to query.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    transport: Arc<dyn Transport>,
    entries: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    descriptor: Arc<ModelDescriptor>,
    made: Option<ModelType>,
}

impl Registry {
    /// A registry whose models talk through the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                transport,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A registry backed by a [`RestConnection`] for the given config.
    pub fn connect(config: ConnectionConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(RestConnection::new(config)?)))
    }

    /// Register a model definition under a name.
    pub fn define(&self, name: &str, descriptor: ModelDescriptor) -> Result<()> {
        let mut entries = self.lock_entries();

        if entries.contains_key(name) {
            return Err(Error::DuplicateModel(name.to_string()));
        }

        entries.insert(
            name.to_string(),
            Entry {
                descriptor: Arc::new(descriptor),
                made: None,
            },
        );

        Ok(())
    }

    /// Register a model via a callback that receives a blank descriptor.
    pub fn define_with<F>(&self, name: &str, build: F) -> Result<()>
    where
        F: FnOnce(ModelDescriptor) -> ModelDescriptor,
    {
        self.define(name, build(ModelDescriptor::default()))
    }

    /// Look up a registered model, booting it on first access.
    pub fn named(&self, name: &str) -> Result<ModelType> {
        let mut entries = self.lock_entries();

        let entry = entries
            .get_mut(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))?;

        if let Some(made) = &entry.made {
            return Ok(made.clone());
        }

        debug!(model = name, "booting model");
        let made = ModelType::make(
            name,
            Arc::clone(&entry.descriptor),
            Arc::clone(&self.inner.transport),
            self.clone(),
        );
        entry.made = Some(made.clone());

        Ok(made)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lock_entries().contains_key(name)
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A booted model class: the descriptor wired to its transport and back
/// to the registry it came from.
///
/// This is the static surface of a model. Query methods open a fresh
/// [`ModelBuilder`]; `new_instance`/`create`/`all`/`find` mirror the
/// usual class-level entry points. Clones share the same booted state.
#[derive(Clone)]
pub struct ModelType {
    inner: Arc<ModelTypeInner>,
}

struct ModelTypeInner {
    name: String,
    descriptor: Arc<ModelDescriptor>,
    transport: Arc<dyn Transport>,
    registry: Registry,
}

impl std::fmt::Debug for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

macro_rules! forwarders {
    ($( ($method:ident) ),* $(,)?) => {
        impl ModelType {
            $(
                #[doc = concat!("Open a fresh query and record `", stringify!($method), "`.")]
                pub fn $method<A: IntoArgs>(&self, args: A) -> ModelBuilder {
                    self.query().$method(args)
                }
            )*
        }
    };
}

forwarders! {
    (select),
    (add_select),
    (where_),
    (or_where),
    (where_between),
    (or_where_between),
    (where_not_between),
    (or_where_not_between),
    (where_nested),
    (where_exists),
    (or_where_exists),
    (where_not_exists),
    (or_where_not_exists),
    (where_in),
    (or_where_in),
    (where_not_in),
    (or_where_not_in),
    (where_null),
    (or_where_null),
    (where_not_null),
    (or_where_not_null),
    (where_date),
    (where_day),
    (where_month),
    (where_year),
    (group_by),
    (having),
    (or_having),
    (order_by),
    (for_page),
}

impl ModelType {
    fn make(
        name: &str,
        descriptor: Arc<ModelDescriptor>,
        transport: Arc<dyn Transport>,
        registry: Registry,
    ) -> Self {
        Self {
            inner: Arc::new(ModelTypeInner {
                name: name.to_string(),
                descriptor,
                transport,
                registry,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.inner.descriptor
    }

    pub(crate) fn descriptor_arc(&self) -> &Arc<ModelDescriptor> {
        &self.inner.descriptor
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.inner.transport)
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Open a fresh query for this model.
    pub fn query(&self) -> ModelBuilder {
        ModelBuilder::new(self.clone())
    }

    /// A new, unsaved instance with the given attributes.
    pub fn new_instance(&self, attributes: Value) -> Result<Model> {
        Model::new(self.clone(), attributes, false)
    }

    /// Save a new record and return the instance.
    pub async fn create(&self, attributes: Value) -> Result<Model> {
        let mut instance = self.new_instance(attributes)?;
        instance.save().await?;
        Ok(instance)
    }

    /// Fetch every record from this model's endpoint.
    pub async fn all(&self, columns: Option<&[&str]>) -> Result<Vec<Model>> {
        self.query().get(columns).await
    }

    /// Find a single record by primary key; `None` when absent.
    pub async fn find<K: serde::Serialize>(
        &self,
        id: K,
        columns: Option<&[&str]>,
    ) -> Result<Option<Model>> {
        self.query().find_one(id, columns).await
    }

    /// Like [`find`](Self::find), but a missing record is an error.
    pub async fn find_or_fail<K: serde::Serialize>(
        &self,
        id: K,
        columns: Option<&[&str]>,
    ) -> Result<Model> {
        self.query().find_or_fail(id, columns).await
    }

    /// Open a fresh query and record a named scope call.
    pub fn scope(&self, name: &str, args: Vec<Value>) -> ModelBuilder {
        self.query().scope(name, args)
    }

    /// Open a fresh query declaring relations to eager-load.
    pub fn with<A: IntoArgs>(&self, relations: A) -> ModelBuilder {
        self.query().with(relations)
    }

    pub fn latest(&self, column: Option<&str>) -> ModelBuilder {
        self.query().latest(column)
    }

    pub fn oldest(&self, column: Option<&str>) -> ModelBuilder {
        self.query().oldest(column)
    }

    pub fn distinct(&self) -> ModelBuilder {
        self.query().distinct()
    }

    pub fn limit(&self, limit: u64) -> ModelBuilder {
        self.query().limit(limit)
    }

    pub fn take(&self, take: u64) -> ModelBuilder {
        self.query().take(take)
    }

    pub fn offset(&self, offset: u64) -> ModelBuilder {
        self.query().offset(offset)
    }

    pub fn skip(&self, skip: u64) -> ModelBuilder {
        self.query().skip(skip)
    }

    /// Hydrate a raw response into model instances. A single object
    /// hydrates as a one-element result; `null` as an empty one.
    pub fn hydrate(&self, raw: Value) -> Result<Vec<Model>> {
        match raw {
            Value::Null => Ok(Vec::new()),
            Value::Array(rows) => rows.into_iter().map(|row| self.hydrate_row(row)).collect(),
            row @ Value::Object(_) => Ok(vec![self.hydrate_row(row)?]),
            other => Err(Error::UnexpectedResponse(format!(
                "cannot hydrate {other} into model instances"
            ))),
        }
    }

    /// Hydrate one raw row into an instance that exists.
    pub fn hydrate_row(&self, row: Value) -> Result<Model> {
        if !row.is_object() {
            return Err(Error::UnexpectedResponse(format!(
                "expected an object row, got {row}"
            )));
        }

        Model::new(self.clone(), row, true)
    }
}
