//! Request/response handlers invoked once per inference request.
//!
//! Each handler pair is stateless: [`InferenceHandler::input`] turns the
//! caller's body into the backend payload and [`InferenceHandler::output`]
//! turns the backend's answer into what the caller receives.

pub mod consistency;
pub mod context;
pub mod error;
pub mod input;
pub mod output;
mod variants;

pub use consistency::{json_eq, FeatureConsistencyCheck};
pub use context::{HandlerContext, DEFAULT_ACCEPT};
pub use error::HandlerError;
pub use input::{transform_input, MediaType};
pub use output::{transform_output, ClientResponse};
pub use variants::{FeatureCheckedHandler, PassThroughHandler};

use crate::backend::BackendResponse;
use async_trait::async_trait;
use bytes::Bytes;

/// A request/response handler pair.
#[async_trait]
pub trait InferenceHandler: Send + Sync {
    /// Transform the raw request body into the backend payload.
    async fn input(&self, body: Bytes, ctx: &HandlerContext) -> Result<String, HandlerError>;

    /// Transform the backend response into the client response.
    async fn output(
        &self,
        response: BackendResponse,
        ctx: &HandlerContext,
    ) -> Result<ClientResponse, HandlerError> {
        transform_output(response, &ctx.accept_header)
    }

    /// Handler name, used in logs.
    fn name(&self) -> &str;
}
