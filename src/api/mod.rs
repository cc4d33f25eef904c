//! API Module
//!
//! HTTP handlers and routing: cache diagnostics plus the content endpoints
//! served through the cached data-access services.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats`, `DELETE /cache[/:namespace[/:key]]` - Cache diagnostics
//! - `POST /cache/invalidate/:event` - Event invalidation
//! - `/posts/...`, `/users/...` - Content reads and writes

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
