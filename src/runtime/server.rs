//! HTTP server hosting the handlers.

use crate::backend::{HttpBackend, HttpBackendConfig};
use crate::feature_store::{HttpFeatureStore, HttpFeatureStoreConfig};
use crate::handler::{
    FeatureCheckedHandler, FeatureConsistencyCheck, InferenceHandler, PassThroughHandler,
};
use crate::http::{InvocationRequest, InvocationResponse};
use crate::runtime::{Pipeline, ServerConfig};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Inference server.
///
/// Accepts `POST /invocations` and `GET /ping`, running every invocation
/// through the configured [`Pipeline`].
pub struct InferenceServer {
    /// Server configuration.
    config: ServerConfig,
    /// Handler + backend.
    pipeline: Arc<Pipeline>,
}

impl InferenceServer {
    /// Create a server around an existing pipeline.
    pub fn new(config: ServerConfig, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build the backend client and handler variant described by `config`.
    ///
    /// A configured feature group selects [`FeatureCheckedHandler`];
    /// otherwise [`PassThroughHandler`] is used.
    pub fn from_config(config: ServerConfig) -> Result<Self, BoxError> {
        let backend = HttpBackend::new(
            HttpBackendConfig::new(&config.backend_url, &config.model_name)
                .timeout(config.backend_timeout()),
        )?;

        let handler: Arc<dyn InferenceHandler> = match &config.feature_group {
            Some(group) => {
                let store = HttpFeatureStore::new(
                    HttpFeatureStoreConfig::new(&config.feature_store_url)
                        .timeout(config.feature_store_timeout()),
                )?;
                let mut check = FeatureConsistencyCheck::new(Arc::new(store), group);
                if let Some(name) = &config.feature_name {
                    check = check.with_feature_name(name);
                }
                Arc::new(FeatureCheckedHandler::new(check))
            }
            None => Arc::new(PassThroughHandler::new()),
        };

        Ok(Self::new(config, Pipeline::new(handler, Arc::new(backend))))
    }

    /// Get the pipeline.
    pub fn pipeline(&self) -> Arc<Pipeline> {
        self.pipeline.clone()
    }

    /// Bind to the configured address and serve forever.
    pub async fn run(self) -> Result<(), BoxError> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections accepted from `listener`.
    pub async fn serve(self, listener: TcpListener) -> Result<(), BoxError> {
        info!(
            "Inference server listening on {} (handler: {})",
            listener.local_addr()?,
            self.pipeline.handler_name()
        );

        let pipeline = self.pipeline.clone();
        let max_body_size = self.config.max_body_size;

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let pipeline = pipeline.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let pipeline = pipeline.clone();
                    async move { handle_request(req, pipeline, max_body_size, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    pipeline: Arc<Pipeline>,
    max_body_size: usize,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();
    let request_id = generate_request_id();

    debug!(
        "Handling request: {} {} from {} [{}]",
        method, path, remote_addr, request_id
    );

    match (&method, path.as_str()) {
        (&Method::GET, "/ping") => Ok(build_response(InvocationResponse::ok())),
        (&Method::POST, "/invocations") => {
            let request = match convert_request(req, max_body_size).await {
                Ok(request) => request,
                Err(response) => return Ok(build_response(response)),
            };
            Ok(build_response(pipeline.invoke(request, &request_id).await))
        }
        (_, "/ping") | (_, "/invocations") => Ok(build_response(InvocationResponse::error(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("method {} not allowed on {}", method, path),
        ))),
        _ => Ok(build_response(InvocationResponse::error(
            StatusCode::NOT_FOUND,
            format!("no route for {}", path),
        ))),
    }
}

/// Convert a hyper Request to an InvocationRequest.
async fn convert_request(
    req: Request<Incoming>,
    max_body_size: usize,
) -> Result<InvocationRequest, InvocationResponse> {
    let (parts, body) = req.into_parts();

    let mut request = InvocationRequest::new();
    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request = request.header(name.as_str(), v);
        }
    }

    // The limit is enforced frame by frame while reading.
    let body_bytes = match Limited::new(body, max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Rejected request body larger than {} bytes", max_body_size);
            return Err(InvocationResponse::error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
            ));
        }
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return Err(InvocationResponse::error(
                StatusCode::BAD_REQUEST,
                e.to_string(),
            ));
        }
    };

    if !body_bytes.is_empty() {
        request = request.body(body_bytes);
    }
    Ok(request)
}

/// Build a hyper Response from an InvocationResponse.
fn build_response(response: InvocationResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status);

    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }

    builder
        .body(Full::new(response.body))
        .unwrap_or_else(|e| {
            warn!("Invalid response, falling back to 500 Internal Server Error: {}", e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

/// Generate a unique request ID.
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:x}", timestamp)
}
