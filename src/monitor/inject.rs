use std::sync::Arc;

use super::pipeline::Pipeline;
use super::watch::Extractor;
use crate::target::{method, Method};

/// Wrap `original` so every successful call is followed by the interception pipeline.
///
/// The receiver and arguments reach the original untouched, and its result is
/// what the caller gets back. An error from the original skips the pipeline
/// and is returned as is. Wrapping an already wrapped method adds a layer.
pub fn inject<R: 'static>(
    name: &str,
    original: Method,
    extractor: Extractor<R>,
    pipeline: Arc<Pipeline<R>>,
) -> Method {
    let name = name.to_string();
    method(move |receiver, args| {
        let result = original(receiver, args)?;
        let outcome = pipeline.intercept(&name, &extractor, receiver, args);
        pipeline.settle(&name, outcome)?;
        Ok(result)
    })
}
