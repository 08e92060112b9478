//! Partner GraphQL client.
//!
//! Wires the pieces the banking front-end relies on around a plain HTTP
//! transport:
//!
//! | Piece | Role |
//! |-------|------|
//! | [`partner_path`] | Endpoint selection by project mode |
//! | [`CombinedError::is_unauthorized`] | Session expiry detection |
//! | [`ErrorHandler`] | Login redirect, or backend error logging |
//! | [`CacheConfig`] | Key rules and relay pagination fields |
//! | [`GraphqlClient`] | Requests with cookies, request ids, and dedup |
//!
//! # Example
//!
//! ```no_run
//! use banking_toolkit::graphql::{CacheConfig, ConsoleNavigator, ErrorHandler, GraphqlClient, Operation};
//! use banking_toolkit::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?.graphql;
//!     let project = config.project();
//!     let handler = Arc::new(ErrorHandler::new(&config.base_url, project.as_ref(), Arc::new(ConsoleNavigator)));
//!     let client = GraphqlClient::partner(&config, handler, CacheConfig::partner(Vec::<String>::new()))?;
//!
//!     let data = client.fetch(&Operation::query("query Me { user { id } }")).await?;
//!     println!("{}", data);
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
mod endpoint;
mod error;
mod handler;
mod operation;

pub use cache::{CacheConfig, KeyRule, MergeMode};
pub use client::{ClientOptions, GraphqlClient, REQUEST_ID_HEADER};
pub use endpoint::{
    join_url, login_path, partner_path, ProjectConfiguration, ProjectMode, UNAUTHENTICATED_PATH,
};
pub use error::{CombinedError, GraphqlError};
pub use handler::{log_backend_error, ConsoleNavigator, ErrorDisposition, ErrorHandler, Navigator};
pub use operation::{parse_operation_result, Operation, OperationKind, OperationResult};
