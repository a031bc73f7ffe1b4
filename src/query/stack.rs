use serde::Serialize;
use serde_json::{Value, to_value};

use crate::core::Result;

/// A single recorded builder invocation: `(method name, arguments)`.
///
/// Serializes to the wire form `["where", ["votes", ">", 100]]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call(pub String, pub Vec<Value>);

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Call(name.into(), args)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn args(&self) -> &[Value] {
        &self.1
    }
}

/// The ordered list of recorded builder calls.
///
/// Append-only while the query is being chained; serialized verbatim as an
/// ordered JSON array once a terminal method hands it to the transport.
/// Call order is the one strict ordering contract in the system, so nothing
/// here ever sorts, dedups or rewrites entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallStack(Vec<Call>);

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call. The single mutation point for the stack.
    pub fn push(&mut self, name: impl Into<String>, args: Vec<Value>) {
        self.0.push(Call::new(name, args));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn calls(&self) -> &[Call] {
        &self.0
    }

    /// The JSON wire form, e.g. `[["where",["a",1]],["orderBy",["b"]]]`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

/// Conversion of caller arguments into the positional argument list that
/// gets recorded on the stack.
///
/// The original API is variadic and entirely untyped: whatever the caller
/// passes is forwarded to the server unchanged. Tuples stand in for the
/// variadic forms, so `where_(("votes", ">", 100))` records exactly
/// `["where", ["votes", ">", 100]]`.
///
/// Conversion is lossy on purpose: an argument that fails to serialize
/// is recorded as `null`, the same way `JSON.stringify` renders
/// unserializable values, rather than aborting the chain.
pub trait IntoArgs {
    fn into_args(self) -> Vec<Value>;
}

impl IntoArgs for () {
    fn into_args(self) -> Vec<Value> {
        Vec::new()
    }
}

impl<T: Serialize> IntoArgs for Vec<T> {
    fn into_args(self) -> Vec<Value> {
        self.into_iter()
            .map(|v| to_value(v).unwrap_or(Value::Null))
            .collect()
    }
}

impl<T: Serialize> IntoArgs for &[T] {
    fn into_args(self) -> Vec<Value> {
        self.iter()
            .map(|v| to_value(v).unwrap_or(Value::Null))
            .collect()
    }
}

macro_rules! impl_into_args_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoArgs for $ty {
                fn into_args(self) -> Vec<Value> {
                    vec![to_value(self).unwrap_or(Value::Null)]
                }
            }
        )*
    };
}

impl_into_args_scalar!(&str, String, i32, i64, u32, u64, f64, bool, Value);

macro_rules! impl_into_args_tuple {
    ($($name:ident),+) => {
        impl<$($name: Serialize),+> IntoArgs for ($($name,)+) {
            fn into_args(self) -> Vec<Value> {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                vec![$(to_value($name).unwrap_or(Value::Null)),+]
            }
        }
    };
}

impl_into_args_tuple!(A);
impl_into_args_tuple!(A, B);
impl_into_args_tuple!(A, B, C);
impl_into_args_tuple!(A, B, C, D);
impl_into_args_tuple!(A, B, C, D, E);
