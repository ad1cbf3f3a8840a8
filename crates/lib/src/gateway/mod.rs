//! Gateway: HTTP server for the relay.
//!
//! Single port serves `GET /` (health and version, or a redirect) and the LINE webhook at the
//! configured path. The webhook runs signature check → storage init → event routing.

mod server;
mod version;

pub use server::{build_router, run_gateway, serve, GatewayState, WebhookError};
pub use version::{current_version, HealthResponse, VersionSource};
