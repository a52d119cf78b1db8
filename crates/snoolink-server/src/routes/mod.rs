//! HTTP routes.

pub mod auth;
pub mod health;
pub mod reddit;

pub use auth::{
    AccessTokenResponse, AuthCheckResponse, CallbackParams, CallbackResponse, LoginResponse,
    StatusResponse, auth_check_handler, authorization_hint_middleware, callback_handler,
    clear_token_handler, get_token_handler, login_handler, save_token_handler,
};
pub use health::{HealthResponse, health_routes};
