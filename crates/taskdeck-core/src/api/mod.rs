//! HTTP client for the taskdeck services.
//!
//! `client` carries the authenticated transport (bearer attach, refresh on
//! 401, single retry); `session` and `tasks` are thin wrappers that build
//! requests and interpret responses.

pub mod client;
pub mod error;
pub mod request;
pub mod session;
pub mod tasks;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use request::ApiRequest;
