//! One invocation end to end: input handler, backend, output handler.

use crate::backend::Backend;
use crate::handler::{ClientResponse, HandlerContext, HandlerError, InferenceHandler};
use crate::http::{InvocationRequest, InvocationResponse};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Runs a request through a handler and a backend.
#[derive(Clone)]
pub struct Pipeline {
    handler: Arc<dyn InferenceHandler>,
    backend: Arc<dyn Backend>,
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(handler: Arc<dyn InferenceHandler>, backend: Arc<dyn Backend>) -> Self {
        Self { handler, backend }
    }

    /// Name of the configured handler.
    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    /// Run the request, returning the typed result.
    ///
    /// The backend is only called once the input stage has succeeded.
    pub async fn run(
        &self,
        request: InvocationRequest,
        request_id: &str,
    ) -> Result<ClientResponse, HandlerError> {
        let ctx = HandlerContext::from_request(&request, request_id);

        let payload = self.handler.input(request.body_bytes(), &ctx).await?;
        debug!(
            "Handler '{}' produced {} byte payload [{}]",
            self.handler.name(),
            payload.len(),
            request_id
        );

        let response = self.backend.predict(payload, &ctx).await?;
        self.handler.output(response, &ctx).await
    }

    /// Run the request and convert any failure into an error response.
    pub async fn invoke(&self, request: InvocationRequest, request_id: &str) -> InvocationResponse {
        match self.run(request, request_id).await {
            Ok(response) => response.into(),
            Err(err) => {
                if err.is_client_error() {
                    warn!("Rejected request: {} [{}]", err, request_id);
                } else {
                    error!(
                        "Handler '{}' error: {} [{}]",
                        self.handler.name(),
                        err,
                        request_id
                    );
                }
                err.into()
            }
        }
    }
}
