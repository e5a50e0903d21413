//! The two handler variants shipped with the runtime.

use super::{
    transform_input, FeatureConsistencyCheck, HandlerContext, HandlerError, InferenceHandler,
    MediaType,
};
use async_trait::async_trait;
use bytes::Bytes;

/// JSON pass-through and CSV → `instances` conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughHandler;

impl PassThroughHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InferenceHandler for PassThroughHandler {
    async fn input(&self, body: Bytes, ctx: &HandlerContext) -> Result<String, HandlerError> {
        transform_input(&body, ctx.content_type())
    }

    fn name(&self) -> &str {
        "pass-through"
    }
}

/// JSON input checked against the feature store before it is forwarded.
#[derive(Clone)]
pub struct FeatureCheckedHandler {
    check: FeatureConsistencyCheck,
}

impl FeatureCheckedHandler {
    pub fn new(check: FeatureConsistencyCheck) -> Self {
        Self { check }
    }
}

#[async_trait]
impl InferenceHandler for FeatureCheckedHandler {
    async fn input(&self, body: Bytes, ctx: &HandlerContext) -> Result<String, HandlerError> {
        if ctx.content_type().and_then(MediaType::parse) != Some(MediaType::Json) {
            return Err(HandlerError::unsupported_content_type(ctx.content_type()));
        }
        let inputs = self.check.check_payload(&body).await?;
        Ok(inputs.to_string())
    }

    fn name(&self) -> &str {
        "feature-checked"
    }
}
