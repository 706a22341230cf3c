use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::target::{Receiver, Value};

/// What an extractor derived from one call.
///
/// Only `None` and an empty `Many` suppress the sink. Record contents are never
/// inspected, so `One(Value::Null)` is sent like any other record.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission<R> {
    None,
    One(R),
    /// Sent in order, one sink call per record.
    Many(Vec<R>),
}

impl<R> Emission<R> {
    pub fn is_empty(&self) -> bool {
        match self {
            Emission::None => true,
            Emission::One(_) => false,
            Emission::Many(records) => records.is_empty(),
        }
    }
}

impl<R> From<Option<R>> for Emission<R> {
    fn from(record: Option<R>) -> Self {
        record.map_or(Emission::None, Emission::One)
    }
}

impl<R> From<Vec<R>> for Emission<R> {
    fn from(records: Vec<R>) -> Self {
        Emission::Many(records)
    }
}

/// Derives telemetry from a finished call. Sees the receiver as the method left it.
pub type Extractor<R> = Arc<dyn Fn(&Receiver, &[Value]) -> anyhow::Result<Emission<R>> + Send + Sync>;

pub fn extractor<R, F>(f: F) -> Extractor<R>
where
    F: Fn(&Receiver, &[Value]) -> anyhow::Result<Emission<R>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A watch entry: either the extractor itself, or the name of one registered on the monitor.
pub enum Hook<R> {
    Extractor(Extractor<R>),
    Named(String),
}

impl<R> Clone for Hook<R> {
    fn clone(&self) -> Self {
        match self {
            Hook::Extractor(f) => Hook::Extractor(Arc::clone(f)),
            Hook::Named(name) => Hook::Named(name.clone()),
        }
    }
}

impl<R> std::fmt::Debug for Hook<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hook::Extractor(_) => f.write_str("Extractor(..)"),
            Hook::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// Method name -> hook. Iterated in name order.
pub struct WatchSpec<R> {
    entries: BTreeMap<String, Hook<R>>,
}

impl<R> Clone for WatchSpec<R> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<R> std::fmt::Debug for WatchSpec<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<R> Default for WatchSpec<R> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<R> WatchSpec<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch<F>(mut self, method: &str, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> anyhow::Result<Emission<R>> + Send + Sync + 'static,
    {
        self.entries
            .insert(method.to_string(), Hook::Extractor(extractor(f)));
        self
    }

    pub fn watch_named(mut self, method: &str, extractor: &str) -> Self {
        self.entries
            .insert(method.to_string(), Hook::Named(extractor.to_string()));
        self
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        config
            .watch
            .iter()
            .fold(Self::new(), |spec, (method, name)| spec.watch_named(method, name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Hook<R>)> {
        self.entries.iter().map(|(name, hook)| (name.as_str(), hook))
    }
}
