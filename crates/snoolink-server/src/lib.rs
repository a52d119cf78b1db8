//! HTTP surface for the snoolink Reddit OAuth wrapper.
//!
//! Exposes the authorization flow (`/login` and the redirect callback),
//! credential management under `/auth`, and the Reddit passthrough routes
//! under `/api`.
//!
//! # Example
//!
//! ```ignore
//! use snoolink_server::{AppState, Server};
//!
//! let resolved = snoolink_config::load_config(None)?.config.resolve(config_dir)?;
//! let server = Server::from_state(AppState::from_resolved(&resolved)?);
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use logging::request_logging_middleware;
pub use state::AppState;

use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// The snoolink HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::get;

        let mut router = Router::new()
            .merge(routes::health_routes())
            .route("/login", get(routes::login_handler))
            .merge(self.auth_routes())
            .nest(
                "/api",
                self.api_routes().layer(middleware::from_fn_with_state(
                    self.state.clone(),
                    routes::authorization_hint_middleware,
                )),
            );

        let callback_path = self.state.config.callback_path.as_str();
        if config::is_reserved_path(callback_path) {
            tracing::error!(
                path = callback_path,
                "Callback path collides with a built-in route; callback not mounted"
            );
        } else {
            router = router.route(callback_path, get(routes::callback_handler));
        }

        let mut router = router
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        if self.state.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router.with_state(self.state.clone())
    }

    /// Credential management routes.
    fn auth_routes(&self) -> Router<AppState> {
        use axum::routing::get;

        Router::new()
            .route("/auth/check", get(routes::auth_check_handler))
            .route(
                "/auth/token",
                get(routes::get_token_handler)
                    .post(routes::save_token_handler)
                    .delete(routes::clear_token_handler),
            )
    }

    /// Reddit passthrough routes.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{delete, get, post, put};
        use routes::reddit::*;

        Router::new()
            // Identity
            .route("/me", get(me_handler))
            .route("/me/karma", get(karma_handler))
            .route("/me/trophies", get(trophies_handler))
            // Own content
            .route("/me/saved", get(saved_handler))
            .route("/me/hidden", get(hidden_handler))
            .route("/me/upvoted", get(upvoted_handler))
            .route("/me/downvoted", get(downvoted_handler))
            // Subreddits
            .route("/subreddits/mine", get(subscribed_handler))
            .route("/subreddits/{category}", get(subreddits_by_category_handler))
            .route("/subreddit/{subreddit}", get(subreddit_about_handler))
            .route("/subreddit/{subreddit}/rules", get(subreddit_rules_handler))
            .route(
                "/subreddit/{subreddit}/moderators",
                get(subreddit_moderators_handler),
            )
            .route(
                "/subreddit/{subreddit}/posts/{sort}",
                get(subreddit_posts_handler),
            )
            .route("/subreddit/{subreddit}/wiki", get(wiki_pages_handler))
            .route("/subreddit/{subreddit}/wiki/{page}", get(wiki_page_handler))
            .route("/subreddit/{subreddit}/traffic", get(traffic_handler))
            .route("/subreddit/{subreddit}/flairs", get(flairs_handler))
            .route("/trending", get(trending_handler))
            // Posts
            .route("/posts/{sort}", get(posts_handler))
            .route("/post/{post_id}", get(post_details_handler))
            .route("/post/{post_id}/duplicates", get(post_duplicates_handler))
            .route("/by_ids", get(by_ids_handler))
            // Users
            .route("/user/{username}", get(user_about_handler))
            .route("/user/{username}/posts", get(user_posts_handler))
            .route("/user/{username}/comments", get(user_comments_handler))
            // Search and multireddits
            .route("/search", get(search_handler))
            .route("/multireddits/{username}", get(multireddits_handler))
            .route("/multireddit/{username}/{name}", get(multireddit_handler))
            // Mutations
            .route("/vote", post(vote_handler))
            .route("/save", post(save_handler))
            .route("/unsave", post(unsave_handler))
            .route("/hide", post(hide_handler))
            .route("/unhide", post(unhide_handler))
            .route(
                "/comment",
                post(add_comment_handler).put(edit_comment_handler),
            )
            .route("/comment/{comment_id}", delete(delete_comment_handler))
            .route("/submit", post(submit_handler))
            .route("/subscribe", post(subscribe_handler))
            .route("/flair", post(flair_handler))
            .route("/report", post(report_handler))
            .route("/block", post(block_handler))
            // Messages
            .route("/messages/{folder}", get(messages_handler))
            .route("/message", post(send_message_handler))
            .route("/message/read", post(mark_read_handler))
            .route("/message/unread", post(mark_unread_handler))
            // Friends
            .route("/friends", get(friends_handler))
            .route(
                "/friends/{username}",
                put(add_friend_handler).delete(remove_friend_handler),
            )
            // Preferences
            .route(
                "/preferences",
                get(preferences_handler).patch(update_preferences_handler),
            )
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;

        info!(addr = %local_addr, "Starting server");

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
