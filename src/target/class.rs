use std::sync::Arc;

use super::{Prototype, Receiver, Target, TargetKind, Value};
use crate::error::CallError;

/// A class-like target. Its methods live on a prototype shared by every
/// instance created from it.
///
/// The prototype is copy-on-write: instrumenting the class replaces the
/// class's prototype, so instances created earlier keep calling the methods
/// they were created with.
#[derive(Debug, Clone)]
pub struct Class {
    name: String,
    prototype: Arc<Prototype>,
}

impl Class {
    pub fn new(name: &str, prototype: Prototype) -> Self {
        Self {
            name: name.to_string(),
            prototype: Arc::new(prototype),
        }
    }

    /// Build a subclass whose own prototype starts empty and inherits from `parent`.
    ///
    /// The parent prototype is captured as it is now. Instrumenting `parent`
    /// later does not reach this subclass.
    pub fn extends(name: &str, parent: &Class, prototype: impl FnOnce(Prototype) -> Prototype) -> Self {
        let own = prototype(Prototype::inheriting(Arc::clone(&parent.prototype)));
        Self::new(name, own)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prototype(&self) -> &Arc<Prototype> {
        &self.prototype
    }

    pub fn instantiate(&self, receiver: Receiver) -> Instance {
        Instance {
            prototype: Arc::clone(&self.prototype),
            receiver,
        }
    }
}

impl Target for Class {
    fn kind(&self) -> TargetKind {
        TargetKind::Class
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn owner_mut(&mut self) -> &mut Prototype {
        Arc::make_mut(&mut self.prototype)
    }

    fn owner(&self) -> &Prototype {
        &self.prototype
    }
}

#[derive(Debug, Clone)]
pub struct Instance {
    prototype: Arc<Prototype>,
    receiver: Receiver,
}

impl Instance {
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, CallError> {
        let method = self.prototype.method(name)?;
        method(&mut self.receiver, args)
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut Receiver {
        &mut self.receiver
    }
}
