/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use recipebox_api::{app::{build_router, AppState}, config::Config};
/// use recipebox_shared::store::memory::MemoryStore;
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use recipebox_shared::{auth::context::authenticate, store::Store};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// └── /api/
///     ├── /user/
///     │   ├── POST /create            # Register (public)
///     │   ├── POST /token             # Obtain token (public)
///     │   └── GET|PUT|PATCH /me       # Own profile (token)
///     └── /recipe/                    # All token-authenticated
///         ├── GET|POST /recipes
///         ├── GET|PUT|PATCH|DELETE /recipes/:id
///         ├── GET /tags
///         └── PUT|PATCH /tags/:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Token authentication (matched protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_user_routes = Router::new()
        .route("/create", post(routes::user::create_user))
        .route("/token", post(routes::user::create_token));

    let me_routes = Router::new()
        .route(
            "/me",
            get(routes::user::retrieve_me)
                .put(routes::user::update_me)
                .patch(routes::user::partial_update_me),
        )
        .route_layer(from_fn_with_state(state.clone(), token_auth_layer));

    let recipe_routes = Router::new()
        .route(
            "/recipes",
            get(routes::recipe::list_recipes).post(routes::recipe::create_recipe),
        )
        .route(
            "/recipes/:id",
            get(routes::recipe::retrieve_recipe)
                .put(routes::recipe::update_recipe)
                .patch(routes::recipe::partial_update_recipe)
                .delete(routes::recipe::destroy_recipe),
        )
        .route("/tags", get(routes::tag::list_tags))
        .route(
            "/tags/:id",
            put(routes::tag::update_tag).patch(routes::tag::partial_update_tag),
        )
        .route_layer(from_fn_with_state(state.clone(), token_auth_layer));

    let api_routes = Router::new()
        .nest("/user", public_user_routes.merge(me_routes))
        .nest("/recipe", recipe_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Token authentication middleware layer
///
/// Resolves the `Authorization` header to its owner and injects the
/// resulting [`AuthContext`](recipebox_shared::auth::context::AuthContext)
/// into request extensions.
async fn token_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let auth_context = authenticate(state.store.as_ref(), auth_header.as_deref()).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
