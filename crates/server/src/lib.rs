//! LexSrt Server - HTTP REST API for token-to-lexeme resolution
//!
//! Exposes document resolution over HTTP. Clients send sentences already
//! tagged by their NLP model; the server resolves every eligible token
//! against Wikidata and answers with the document result.
//!
//! Language and form lookups are cached for the life of the process in
//! size-bounded LRU caches, so repeated documents get cheaper over time.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! Public:
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check (503 while the Wikidata circuit is open)
//!
//! API key required (`X-API-Key` or `Authorization: Bearer`):
//!
//! - `POST /api/v1/resolve` - Resolve a tagged document
//! - `GET /api/v1/languages/{code}` - Language item for an ISO 639 code

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use routes::resolve::{LanguageResponse, ResolveRequest};
pub use server::{build_router, start_server};
pub use state::ServerState;
