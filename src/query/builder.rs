use std::sync::Arc;

use serde_json::Value;

use crate::connection::Transport;
use crate::core::{Error, Result};
use crate::query::stack::{CallStack, IntoArgs};

/// Fluent builder that records which query methods were called and with
/// what arguments, without interpreting any of it.
///
/// The server is the only party that understands the recorded stack, so
/// there is no grammar, no clause model and no client-side validation of
/// column names, operators or types. Arguments are forwarded verbatim.
#[derive(Clone, Default)]
pub struct QueryBuilder {
    transport: Option<Arc<dyn Transport>>,
    stack: CallStack,
    endpoint: Option<String>,
}

macro_rules! recorders {
    ($( ($method:ident, $wire:literal) ),* $(,)?) => {
        impl QueryBuilder {
            $(
                #[doc = concat!("Record a `", $wire, "` call on the stack.")]
                pub fn $method<A: IntoArgs>(self, args: A) -> Self {
                    self.call($wire, args.into_args())
                }
            )*
        }
    };
}

recorders! {
    (select, "select"),
    (add_select, "addSelect"),
    (where_, "where"),
    (or_where, "orWhere"),
    (where_between, "whereBetween"),
    (or_where_between, "orWhereBetween"),
    (where_not_between, "whereNotBetween"),
    (or_where_not_between, "orWhereNotBetween"),
    (where_nested, "whereNested"),
    (where_exists, "whereExists"),
    (or_where_exists, "orWhereExists"),
    (where_not_exists, "whereNotExists"),
    (or_where_not_exists, "orWhereNotExists"),
    (where_in, "whereIn"),
    (or_where_in, "orWhereIn"),
    (where_not_in, "whereNotIn"),
    (or_where_not_in, "orWhereNotIn"),
    (where_null, "whereNull"),
    (or_where_null, "orWhereNull"),
    (where_not_null, "whereNotNull"),
    (or_where_not_null, "orWhereNotNull"),
    (where_date, "whereDate"),
    (where_day, "whereDay"),
    (where_month, "whereMonth"),
    (where_year, "whereYear"),
    (group_by, "groupBy"),
    (having, "having"),
    (or_having, "orHaving"),
    (order_by, "orderBy"),
    (for_page, "forPage"),
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the transport used by the terminal methods.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Append a method call to the stack. Every recorder funnels through
    /// here; it is the single mutation point for the stack.
    pub fn call(mut self, name: &str, args: Vec<Value>) -> Self {
        self.stack.push(name, args);
        self
    }

    /// Set the endpoint for this query, equivalent to the "table" a
    /// server-side builder would select from.
    pub fn from(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Only return distinct results.
    pub fn distinct(self) -> Self {
        self.call("distinct", Vec::new())
    }

    /// Order by latest date, `created_at` unless told otherwise.
    pub fn latest(self, column: Option<&str>) -> Self {
        let args = column.map(single_column).unwrap_or_default();
        self.call("latest", args)
    }

    /// Order by oldest date, `created_at` unless told otherwise.
    pub fn oldest(self, column: Option<&str>) -> Self {
        let args = column.map(single_column).unwrap_or_default();
        self.call("oldest", args)
    }

    pub fn offset(self, offset: u64) -> Self {
        self.call("offset", offset.into_args())
    }

    pub fn skip(self, skip: u64) -> Self {
        self.call("skip", skip.into_args())
    }

    pub fn limit(self, limit: u64) -> Self {
        self.call("limit", limit.into_args())
    }

    pub fn take(self, take: u64) -> Self {
        self.call("take", take.into_args())
    }

    /// The endpoint, optionally with a trailing `/key` segment.
    ///
    /// Fails fast with a configuration error when no endpoint is set;
    /// this is checked before any I/O is attempted.
    pub fn endpoint_url(&self, key: Option<&str>) -> Result<String> {
        let endpoint = self.endpoint.as_deref().filter(|e| !e.is_empty()).ok_or_else(|| {
            Error::Configuration("endpoint is required but is not set".into())
        })?;

        match key {
            Some(key) => Ok(format!("{endpoint}/{key}")),
            None => Ok(endpoint.to_string()),
        }
    }

    /// Execute the query and return the raw JSON result.
    ///
    /// An optional column selection is folded into a `select` call before
    /// the stack is shipped.
    pub async fn get(mut self, columns: Option<&[&str]>) -> Result<Value> {
        if let Some(columns) = columns {
            self = self.select(columns);
        }
        let url = self.endpoint_url(None)?;
        let transport = self.transport()?;
        transport.get(&url, &self.stack).await
    }

    /// Insert a new record via POST to the endpoint.
    pub async fn insert(self, values: &Value) -> Result<Value> {
        let url = self.endpoint_url(None)?;
        let transport = self.transport()?;
        transport.post(&url, values).await
    }

    /// Run the query as an update. The accumulated stack travels in the
    /// query string so the server can replay it for bulk updates.
    pub async fn update(self, values: &Value) -> Result<Value> {
        let url = self.endpoint_url(None)?;
        let transport = self.transport()?;
        transport.put(&url, values, &self.stack).await
    }

    /// Run the query as a delete. Resolves to a success flag.
    pub async fn delete(self) -> Result<bool> {
        let url = self.endpoint_url(None)?;
        let transport = self.transport()?;
        transport.delete(&url, &self.stack).await
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub(crate) fn transport(&self) -> Result<Arc<dyn Transport>> {
        self.transport.clone().ok_or_else(|| {
            Error::Configuration("transport is required but is not set".into())
        })
    }
}

fn single_column(column: &str) -> Vec<Value> {
    vec![Value::String(column.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chained_calls_record_in_order() {
        let builder = QueryBuilder::new().where_(("a", 1)).order_by("b");

        assert_eq!(
            builder.stack().to_json().unwrap(),
            r#"[["where",["a",1]],["orderBy",["b"]]]"#
        );
    }

    #[test]
    fn test_arguments_pass_through_unchanged() {
        let builder = QueryBuilder::new()
            .where_(("votes", ">", 100))
            .where_in(("id", vec![1, 2, 3]))
            .where_null("deleted_at")
            .for_page((2, 25));

        let calls = builder.stack().calls();
        assert_eq!(calls[0].args(), &[json!("votes"), json!(">"), json!(100)]);
        assert_eq!(calls[1].args(), &[json!("id"), json!([1, 2, 3])]);
        assert_eq!(calls[2].args(), &[json!("deleted_at")]);
        assert_eq!(calls[3].args(), &[json!(2), json!(25)]);
    }

    #[test]
    fn test_distinct_and_pagination_helpers() {
        let builder = QueryBuilder::new().distinct().limit(10).offset(20);

        assert_eq!(
            builder.stack().to_json().unwrap(),
            r#"[["distinct",[]],["limit",[10]],["offset",[20]]]"#
        );
    }

    #[test]
    fn test_latest_with_and_without_column() {
        let builder = QueryBuilder::new().latest(None).oldest(Some("published_at"));

        assert_eq!(
            builder.stack().to_json().unwrap(),
            r#"[["latest",[]],["oldest",["published_at"]]]"#
        );
    }

    #[test]
    fn test_endpoint_url() {
        let builder = QueryBuilder::new().from("api/posts");
        assert_eq!(builder.endpoint_url(None).unwrap(), "api/posts");
        assert_eq!(builder.endpoint_url(Some("7")).unwrap(), "api/posts/7");
    }

    #[test]
    fn test_missing_endpoint_fails_fast() {
        let builder = QueryBuilder::new();
        assert!(matches!(
            builder.endpoint_url(None),
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_get_without_transport_is_a_configuration_error() {
        let result = QueryBuilder::new().from("api/posts").get(None).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_get_without_endpoint_is_a_configuration_error() {
        let result = QueryBuilder::new().get(None).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
