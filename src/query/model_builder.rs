use serde::Serialize;
use serde_json::{Value, to_value};

use crate::core::{Error, Result};
use crate::model::Model;
use crate::query::builder::QueryBuilder;
use crate::query::stack::{CallStack, IntoArgs};
use crate::registry::ModelType;

/// Query builder bound to a model type.
///
/// Wraps the raw [`QueryBuilder`] stack mechanism with primary-key lookup
/// sugar, named scopes, eager-load declarations, and hydration of results
/// into model instances. Created via `ModelType::query()` or
/// `Model::new_query()`; the binding supplies the endpoint and transport
/// from the model's descriptor, so a builder always has at most one model
/// and one endpoint.
#[derive(Clone)]
pub struct ModelBuilder {
    query: QueryBuilder,
    model: ModelType,
    bound_key: Option<Value>,
}

macro_rules! delegates {
    ($( ($method:ident) ),* $(,)?) => {
        impl ModelBuilder {
            $(
                #[doc = concat!("See [`QueryBuilder::", stringify!($method), "`].")]
                pub fn $method<A: IntoArgs>(mut self, args: A) -> Self {
                    self.query = self.query.$method(args);
                    self
                }
            )*
        }
    };
}

delegates! {
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

impl ModelBuilder {
    pub(crate) fn new(model: ModelType) -> Self {
        let query = QueryBuilder::new()
            .from(model.descriptor().endpoint.clone())
            .with_transport(model.transport());

        Self {
            query,
            model,
            bound_key: None,
        }
    }

    /// Bind the primary key of a concrete instance, targeting updates and
    /// deletes at `endpoint/{key}` instead of the `*` wildcard.
    pub(crate) fn bind_key(mut self, key: Option<Value>) -> Self {
        self.bound_key = key;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.query = self.query.distinct();
        self
    }

    pub fn latest(mut self, column: Option<&str>) -> Self {
        self.query = self.query.latest(column);
        self
    }

    pub fn oldest(mut self, column: Option<&str>) -> Self {
        self.query = self.query.oldest(column);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query = self.query.offset(offset);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.query = self.query.skip(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.query = self.query.take(take);
        self
    }

    /// Record a named scope call: `["scope", [name]]`, or
    /// `["scope", [name, args]]` when arguments are given.
    ///
    /// Scopes are interpreted server-side only; the declared scope names
    /// on the model descriptor document what the server understands, and
    /// this single entry point forwards any of them.
    pub fn scope(mut self, name: &str, args: Vec<Value>) -> Self {
        let mut call_args = vec![Value::String(name.to_string())];
        if !args.is_empty() {
            call_args.push(Value::Array(args));
        }

        self.query = self.query.call("scope", call_args);
        self
    }

    /// Declare relations to eager-load: `["with", [names...]]`.
    pub fn with<A: IntoArgs>(mut self, relations: A) -> Self {
        self.query = self.query.call("with", relations.into_args());
        self
    }

    /// Execute and hydrate every row into a model instance.
    pub async fn get(self, columns: Option<&[&str]>) -> Result<Vec<Model>> {
        let model = self.model.clone();
        let raw = self.query.get(columns).await?;
        model.hydrate(raw)
    }

    /// Execute with `limit(1)` and return the first result, if any.
    pub async fn first(self, columns: Option<&[&str]>) -> Result<Option<Model>> {
        let results = self.limit(1).get(columns).await?;
        Ok(results.into_iter().next())
    }

    /// Like [`first`](Self::first), but an empty result is an error.
    pub async fn first_or_fail(self, columns: Option<&[&str]>) -> Result<Model> {
        self.first(columns).await?.ok_or(Error::NotFound)
    }

    /// Find by primary key. A list of ids delegates to
    /// [`find_many`](Self::find_many) semantics via `whereIn`; a missing
    /// record resolves to `None`, not an error.
    pub async fn find<K: Serialize>(
        self,
        id: K,
        columns: Option<&[&str]>,
    ) -> Result<Vec<Model>> {
        let id = to_value(id)?;

        match id {
            Value::Array(ids) => self.find_many(ids, columns).await,
            id => Ok(self.find_one(id, columns).await?.into_iter().collect()),
        }
    }

    /// Find a single record by primary key.
    pub async fn find_one<K: Serialize>(
        self,
        id: K,
        columns: Option<&[&str]>,
    ) -> Result<Option<Model>> {
        let key_name = self.model.descriptor().primary_key.clone();
        let id = to_value(id)?;
        self.where_((key_name, id)).first(columns).await
    }

    /// Find many records by primary key; resolves to a possibly-empty list.
    pub async fn find_many<K: Serialize>(
        self,
        ids: Vec<K>,
        columns: Option<&[&str]>,
    ) -> Result<Vec<Model>> {
        let key_name = self.model.descriptor().primary_key.clone();
        self.where_in((key_name, ids)).get(columns).await
    }

    /// Like [`find_one`](Self::find_one), but a missing record is an error.
    pub async fn find_or_fail<K: Serialize>(
        self,
        id: K,
        columns: Option<&[&str]>,
    ) -> Result<Model> {
        self.find_one(id, columns).await?.ok_or(Error::NotFound)
    }

    /// A single column's value from the first result.
    pub async fn value(self, column: &str) -> Result<Option<Value>> {
        let first = self.first(Some(&[column])).await?;
        Ok(first.map(|model| model.attribute(column).unwrap_or(Value::Null)))
    }

    /// Alias of [`value`](Self::value).
    pub async fn pluck(self, column: &str) -> Result<Option<Value>> {
        self.value(column).await
    }

    /// One column's values across all rows, in row order.
    pub async fn lists(self, column: &str) -> Result<Vec<Value>> {
        let results = self.get(Some(&[column])).await?;

        Ok(results
            .iter()
            .map(|model| model.attribute(column).unwrap_or(Value::Null))
            .collect())
    }

    /// Insert a new record via POST.
    pub async fn insert(self, values: &Value) -> Result<Value> {
        self.query.insert(values).await
    }

    /// Run an update against `endpoint/{key}` for a bound instance, or
    /// the `endpoint/*` wildcard meaning "every record matched by the
    /// stack" when no instance is bound.
    pub async fn update(self, values: &Value) -> Result<Value> {
        let key = self.key_segment();
        let url = self.query.endpoint_url(Some(&key))?;
        let transport = self.query.transport()?;
        transport.put(&url, values, self.query.stack()).await
    }

    /// Run a delete; same `{key}`-or-`*` targeting as
    /// [`update`](Self::update). Resolves to a success flag.
    pub async fn delete(self) -> Result<bool> {
        let key = self.key_segment();
        let url = self.query.endpoint_url(Some(&key))?;
        let transport = self.query.transport()?;
        transport.delete(&url, self.query.stack()).await
    }

    pub fn stack(&self) -> &CallStack {
        self.query.stack()
    }

    fn key_segment(&self) -> String {
        match &self.bound_key {
            Some(Value::String(key)) => key.clone(),
            Some(key) if !key.is_null() => key.to_string(),
            _ => "*".to_string(),
        }
    }
}
