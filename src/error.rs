use thiserror::Error;

/// Configuration errors raised synchronously by `Applicator::apply`.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The watched member exists on the owner but holds a plain value.
    #[error("expected function: member `{name}` is not callable")]
    NotAFunction { name: String },

    /// The watch entry names an extractor that was never registered.
    #[error("expected callback function: extractor `{extractor}` for `{name}` is not registered")]
    CallbackNotFunction { name: String, extractor: String },

    /// The slot no longer holds the wrapper an installation put there.
    #[error("method `{name}` on `{target}` is not wrapped by this installation")]
    NotInstalled { name: String, target: String },

    #[error("failed to load monitor config: {0}")]
    Config(String),
}

/// Errors observed by the caller of a method on an instrumented target.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("no method named `{0}`")]
    NoSuchMethod(String),

    #[error("member `{0}` is not callable")]
    NotCallable(String),

    /// Failure raised by the method body itself. Instrumentation passes it through untouched.
    #[error(transparent)]
    Method(#[from] anyhow::Error),

    #[error("extractor for `{method}` failed")]
    Extractor {
        method: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("sink rejected a record from `{method}`")]
    Sink {
        method: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CallError {
    /// True when the error came from the instrumentation layer rather than the method.
    pub fn is_instrumentation(&self) -> bool {
        matches!(self, CallError::Extractor { .. } | CallError::Sink { .. })
    }
}
