//! Host runtime: configuration, the per-request pipeline and the HTTP server.

mod config;
mod pipeline;
mod server;

pub use config::ServerConfig;
pub use pipeline::Pipeline;
pub use server::InferenceServer;
