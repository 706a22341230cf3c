//! Object model for instrumentable targets.
//!
//! A target is either a [`Class`], whose methods live on a prototype shared by
//! its instances, or a plain [`Object`] that owns its members directly. Either
//! way the methods sit in the slots of a [`Prototype`], the *owner*.

pub mod class;
pub mod object;
pub mod prototype;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::error::CallError;

pub use class::{Class, Instance};
pub use object::Object;
pub use prototype::Prototype;

/// Arguments and return values are dynamic.
pub type Value = serde_json::Value;

/// A callable member. Receives the call's receiver and its arguments.
pub type Method = Arc<dyn Fn(&mut Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync>;

/// Wrap a closure as a [`Method`].
pub fn method<F>(f: F) -> Method
where
    F: Fn(&mut Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The `self` of a call: the named fields of an instance or object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Receiver {
    fields: Map<String, Value>,
}

impl Receiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for Receiver {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// One member of an owner.
#[derive(Clone)]
pub enum Slot {
    Method(Method),
    Field(Value),
}

impl Slot {
    pub fn is_callable(&self) -> bool {
        matches!(self, Slot::Method(_))
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Method(_) => f.write_str("Method(..)"),
            Slot::Field(v) => f.debug_tuple("Field").field(v).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Class,
    Object,
}

/// Anything whose method slots can be instrumented.
pub trait Target {
    fn kind(&self) -> TargetKind;

    /// Name used in log output.
    fn label(&self) -> &str;

    /// The owner of the watched methods. Mutating it must not reach values that
    /// were handed out before the call.
    fn owner_mut(&mut self) -> &mut Prototype;

    fn owner(&self) -> &Prototype;
}
