use std::sync::Arc;

use super::{Prototype, Receiver, Target, TargetKind, Value};
use crate::error::CallError;

/// A plain object: it owns its members and is its own receiver.
#[derive(Debug, Clone)]
pub struct Object {
    name: String,
    members: Prototype,
    receiver: Receiver,
}

impl Object {
    pub fn new(name: &str, members: Prototype) -> Self {
        Self {
            name: name.to_string(),
            members,
            receiver: Receiver::new(),
        }
    }

    /// An object whose own members are `members` and whose inherited members come from `parent`.
    pub fn with_parent(name: &str, parent: Arc<Prototype>, members: impl FnOnce(Prototype) -> Prototype) -> Self {
        Self::new(name, members(Prototype::inheriting(parent)))
    }

    pub fn with_state(mut self, receiver: Receiver) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, CallError> {
        let method = self.members.method(name)?;
        method(&mut self.receiver, args)
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut Receiver {
        &mut self.receiver
    }
}

impl Target for Object {
    fn kind(&self) -> TargetKind {
        TargetKind::Object
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn owner_mut(&mut self) -> &mut Prototype {
        &mut self.members
    }

    fn owner(&self) -> &Prototype {
        &self.members
    }
}
