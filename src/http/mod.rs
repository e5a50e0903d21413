//! HTTP value types exchanged between the runtime and the handlers.

mod request;
mod response;

pub use request::InvocationRequest;
pub use response::InvocationResponse;
