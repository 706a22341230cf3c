//! Method-level instrumentation.
//!
//! `AopMonitor::build(sink)` -> `configure(watch)` -> `apply(target)`.
//!
//! Every watched method that the target's owner defines as an own member is
//! replaced by a wrapper that calls the original, then hands the call's
//! receiver and arguments to an extractor and sends the resulting records to
//! the sink. The wrapper always returns the original's result unless the
//! monitor runs with [`FailurePolicy::Propagate`] and instrumentation fails.

pub mod inject;
pub mod installation;
pub mod pipeline;
pub mod watch;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::{FailurePolicy, MonitorConfig};
use crate::error::MonitorError;
use crate::sink::Sink;
use crate::stats::{MonitorStats, StatsSnapshot};
use crate::target::{Method, Prototype, Receiver, Slot, Target, Value};

pub use inject::inject;
use installation::Replaced;

pub use installation::Installation;
pub use pipeline::Pipeline;
pub use watch::{extractor, Emission, Extractor, Hook, WatchSpec};

/// Holds the sink and the catalog of named extractors. Reusable across any
/// number of watch specifications and targets.
pub struct AopMonitor<R> {
    sink: Arc<dyn Sink<R>>,
    policy: FailurePolicy,
    stats: Arc<MonitorStats>,
    catalog: HashMap<String, Extractor<R>>,
}

impl<R: 'static> AopMonitor<R> {
    /// The sink is not exercised here; a broken sink only shows up once a record is sent.
    pub fn build(sink: impl Sink<R> + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
            policy: FailurePolicy::default(),
            stats: Arc::new(MonitorStats::new()),
            catalog: HashMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Make an extractor available to [`Hook::Named`] watch entries.
    pub fn register_extractor<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> anyhow::Result<Emission<R>> + Send + Sync + 'static,
    {
        self.catalog.insert(name.to_string(), extractor(f));
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn configure(&self, watch: WatchSpec<R>) -> Applicator<R> {
        self.applicator(watch, self.policy)
    }

    /// An applicator that watches nothing.
    pub fn configure_default(&self) -> Applicator<R> {
        self.configure(WatchSpec::new())
    }

    /// Watch list and failure policy both come from `config`.
    pub fn configure_from(&self, config: &MonitorConfig) -> Applicator<R> {
        self.applicator(WatchSpec::from_config(config), config.failure_policy)
    }

    fn applicator(&self, watch: WatchSpec<R>, policy: FailurePolicy) -> Applicator<R> {
        Applicator {
            watch,
            catalog: self.catalog.clone(),
            pipeline: Arc::new(Pipeline::new(
                Arc::clone(&self.sink),
                policy,
                Arc::clone(&self.stats),
            )),
        }
    }
}

/// A watch specification bound to a sink, ready to instrument targets.
pub struct Applicator<R> {
    watch: WatchSpec<R>,
    catalog: HashMap<String, Extractor<R>>,
    pipeline: Arc<Pipeline<R>>,
}

struct Planned<R> {
    name: String,
    original: Method,
    extractor: Extractor<R>,
}

impl<R: 'static> Applicator<R> {
    pub fn watch(&self) -> &WatchSpec<R> {
        &self.watch
    }

    /// Instrument `target` and hand it back.
    pub fn apply<T: Target>(&self, mut target: T) -> Result<T, MonitorError> {
        self.apply_in_place(&mut target)?;
        Ok(target)
    }

    /// Instrument `target` where it stands. All watched entries are validated
    /// before any slot is replaced, so an error leaves the owner untouched.
    pub fn apply_in_place<T: Target>(&self, target: &mut T) -> Result<Installation, MonitorError> {
        let plan = self.plan(target.owner())?;
        if plan.is_empty() {
            debug!(subject = target.label(), kind = ?target.kind(), "no watched methods on owner");
            return Ok(Installation::new(target.label(), Vec::new()));
        }

        let label = target.label().to_string();
        let kind = target.kind();
        let owner = target.owner_mut();
        let mut replaced = Vec::with_capacity(plan.len());
        for Planned { name, original, extractor } in plan {
            let wrapper = inject(&name, Arc::clone(&original), extractor, Arc::clone(&self.pipeline));
            owner.define(&name, Slot::Method(Arc::clone(&wrapper)));
            debug!(subject = %label, ?kind, method = %name, "method instrumented");
            replaced.push(Replaced {
                name,
                original: Slot::Method(original),
                wrapper,
            });
        }

        Ok(Installation::new(&label, replaced))
    }

    fn plan(&self, owner: &Prototype) -> Result<Vec<Planned<R>>, MonitorError> {
        let mut plan = Vec::new();
        for (name, hook) in self.watch.iter() {
            let original = match owner.own(name) {
                Some(Slot::Method(m)) => Arc::clone(m),
                Some(Slot::Field(_)) => {
                    return Err(MonitorError::NotAFunction {
                        name: name.to_string(),
                    })
                }
                None => {
                    debug!(method = name, "watched method is not an own member, skipped");
                    continue;
                }
            };
            let extractor = self.resolve(name, hook)?;
            plan.push(Planned {
                name: name.to_string(),
                original,
                extractor,
            });
        }
        Ok(plan)
    }

    fn resolve(&self, method: &str, hook: &Hook<R>) -> Result<Extractor<R>, MonitorError> {
        match hook {
            Hook::Extractor(f) => Ok(Arc::clone(f)),
            Hook::Named(name) => self.catalog.get(name).map(Arc::clone).ok_or_else(|| {
                MonitorError::CallbackNotFunction {
                    name: method.to_string(),
                    extractor: name.clone(),
                }
            }),
        }
    }
}
