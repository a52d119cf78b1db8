//! Reddit OAuth token lifecycle and API passthrough.
//!
//! Holds one Reddit credential per [`TokenManager`], refreshes it when it
//! expires, and forwards authenticated calls to `oauth.reddit.com`.
//!
//! # Components
//!
//! - [`credential`] - Credential model and expiry state
//! - [`token_store`] - Durable (file) and in-memory credential storage
//! - [`token_manager`] - Valid-token access with single-flight refresh
//! - [`oauth`] - Authorization URL, state generation, code exchange/refresh
//! - [`auth_flow`] - Redirect and callback handling with state checks
//! - [`passthrough`] - One authenticated upstream request per call
//! - [`reddit`] - Typed helpers for each Reddit operation

pub mod auth_flow;
pub mod credential;
pub mod error;
pub mod oauth;
pub mod passthrough;
pub mod reddit;
pub mod token_manager;
pub mod token_store;

#[cfg(test)]
mod test_support;

pub use auth_flow::{AuthFlow, AuthorizationRequest};
pub use credential::{Credential, TokenState, state_of};
pub use error::{OAuthError, Result};
pub use oauth::{
    AuthorizationServer, HttpAuthorizationServer, OAuthConfig, TokenResponse,
    build_authorization_url, generate_state,
};
pub use passthrough::{Passthrough, PassthroughConfig, UpstreamBody, UpstreamRequest};
pub use reddit::{FlairSelection, RedditApi, Submission, VoteDirection};
pub use token_manager::{ManagerState, SharedTokenManager, TokenInfo, TokenManager};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
