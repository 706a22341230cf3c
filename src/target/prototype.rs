use std::collections::HashMap;
use std::sync::Arc;

use super::{method, Method, Receiver, Slot, Value};
use crate::error::CallError;

/// Holds the own members of a class prototype or plain object, plus an
/// optional parent that supplies inherited members.
#[derive(Debug, Clone, Default)]
pub struct Prototype {
    slots: HashMap<String, Slot>,
    parent: Option<Arc<Prototype>>,
}

impl Prototype {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inheriting(parent: Arc<Prototype>) -> Self {
        Self {
            slots: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn with_method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.define(name, Slot::Method(method(f)));
        self
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.define(name, Slot::Field(value.into()));
        self
    }

    /// Set an own slot, returning whatever it previously held.
    pub fn define(&mut self, name: &str, slot: Slot) -> Option<Slot> {
        self.slots.insert(name.to_string(), slot)
    }

    pub fn remove(&mut self, name: &str) -> Option<Slot> {
        self.slots.remove(name)
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn own(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn parent(&self) -> Option<&Arc<Prototype>> {
        self.parent.as_ref()
    }

    /// Resolve a member through the parent chain.
    pub fn lookup(&self, name: &str) -> Option<&Slot> {
        let mut current = Some(self);
        while let Some(proto) = current {
            if let Some(slot) = proto.slots.get(name) {
                return Some(slot);
            }
            current = proto.parent.as_deref();
        }
        None
    }

    pub fn method(&self, name: &str) -> Result<Method, CallError> {
        match self.lookup(name) {
            Some(Slot::Method(m)) => Ok(Arc::clone(m)),
            Some(Slot::Field(_)) => Err(CallError::NotCallable(name.to_string())),
            None => Err(CallError::NoSuchMethod(name.to_string())),
        }
    }
}
