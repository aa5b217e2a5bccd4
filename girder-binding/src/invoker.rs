// Compiled handler invocation

use crate::context::Context;
use crate::error::InvocationError;
use crate::extractors::BoxedExtractor;
use crate::handler::{ArgumentError, ErasedHandler};
use girder_log::{debug, error};
use std::fmt;
use std::sync::Arc;

/// A handler with one extractor chain per parameter, ready to serve
/// requests. Built by [`crate::RouteCompiler::compile`].
pub struct ControllerMethodInvoker<T, R> {
    method: String,
    extractors: Vec<BoxedExtractor>,
    handler: Arc<dyn ErasedHandler<T, R>>,
}

impl<T, R> ControllerMethodInvoker<T, R> {
    pub(crate) fn new(
        method: String,
        extractors: Vec<BoxedExtractor>,
        handler: Arc<dyn ErasedHandler<T, R>>,
    ) -> Self {
        Self {
            method,
            extractors,
            handler,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn arity(&self) -> usize {
        self.extractors.len()
    }

    pub fn extractors(&self) -> &[BoxedExtractor] {
        &self.extractors
    }

    /// Run every extractor against `context` and call the handler on
    /// `target`.
    ///
    /// Malformed parameters do not fail here; they are recorded in
    /// [`Context::validation`] and the handler still runs. A failure means
    /// either the request could not supply a required value
    /// ([`InvocationError::Binding`]) or the arguments did not fit the
    /// handler ([`InvocationError::Fault`]).
    pub fn invoke(&self, target: &T, context: &Context) -> Result<R, InvocationError> {
        let mut arguments = Vec::with_capacity(self.extractors.len());
        for (index, extractor) in self.extractors.iter().enumerate() {
            let value = extractor.extract(context).map_err(|e| {
                debug!(target: "girder::binding", { method = self.method, index = index }, "extraction failed: {}", e);
                InvocationError::Binding {
                    method: self.method.clone(),
                    index,
                    reason: e.to_string(),
                }
            })?;
            arguments.push(value);
        }

        self.handler.call(target, arguments).map_err(|e| match e {
            ArgumentError::Missing { index, .. } => {
                debug!(target: "girder::binding", { method = self.method, index = index }, "{}", e);
                InvocationError::Binding {
                    method: self.method.clone(),
                    index,
                    reason: e.to_string(),
                }
            }
            ArgumentError::Mismatch { .. } | ArgumentError::Arity { .. } => {
                error!(target: "girder::binding", { method = self.method }, "invocation fault: {}", e);
                InvocationError::Fault {
                    method: self.method.clone(),
                    reason: e.to_string(),
                }
            }
        })
    }
}

impl<T, R> fmt::Debug for ControllerMethodInvoker<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerMethodInvoker")
            .field("method", &self.method)
            .field("extractors", &self.extractors)
            .finish_non_exhaustive()
    }
}
