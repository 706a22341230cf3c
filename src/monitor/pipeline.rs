use std::sync::Arc;

use tracing::{trace, warn};

use super::watch::{Emission, Extractor};
use crate::config::FailurePolicy;
use crate::error::CallError;
use crate::sink::Sink;
use crate::stats::MonitorStats;
use crate::target::{Receiver, Value};

/// Runs after a wrapped method returns: extract, then dispatch each record to the sink.
pub struct Pipeline<R> {
    sink: Arc<dyn Sink<R>>,
    policy: FailurePolicy,
    stats: Arc<MonitorStats>,
}

impl<R> Pipeline<R> {
    pub fn new(sink: Arc<dyn Sink<R>>, policy: FailurePolicy, stats: Arc<MonitorStats>) -> Self {
        Self { sink, policy, stats }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Extract from a finished call and send what came out.
    ///
    /// A sink failure on the sequence path stops the iteration; records after
    /// the failing one are dropped unsent.
    pub fn intercept(
        &self,
        method: &str,
        extractor: &Extractor<R>,
        receiver: &Receiver,
        args: &[Value],
    ) -> Result<(), CallError> {
        self.stats.record_intercepted();

        let emission = extractor(receiver, args).map_err(|source| {
            self.stats.record_extractor_failure();
            CallError::Extractor {
                method: method.to_string(),
                source,
            }
        })?;

        if emission.is_empty() {
            self.stats.record_suppressed();
            return Ok(());
        }

        match emission {
            Emission::None => Ok(()),
            Emission::One(record) => self.dispatch(method, record),
            Emission::Many(records) => {
                for record in records {
                    self.dispatch(method, record)?;
                }
                Ok(())
            }
        }
    }

    /// Apply the failure policy to the outcome of [`Pipeline::intercept`].
    pub fn settle(&self, method: &str, outcome: Result<(), CallError>) -> Result<(), CallError> {
        match (outcome, self.policy) {
            (Ok(()), _) => Ok(()),
            (Err(err), FailurePolicy::Propagate) => Err(err),
            (Err(err), FailurePolicy::Isolate) => {
                let cause = std::error::Error::source(&err)
                    .map(|source| source.to_string())
                    .unwrap_or_default();
                warn!(method, error = %err, cause = %cause, "instrumentation failure isolated");
                Ok(())
            }
        }
    }

    fn dispatch(&self, method: &str, record: R) -> Result<(), CallError> {
        match self.sink.send(record) {
            Ok(()) => {
                self.stats.record_dispatched();
                trace!(method, "record dispatched");
                Ok(())
            }
            Err(source) => {
                self.stats.record_sink_failure();
                Err(CallError::Sink {
                    method: method.to_string(),
                    source,
                })
            }
        }
    }
}
