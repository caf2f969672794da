//! Route configuration.

use crate::handlers;
use crate::middleware::domain_middleware;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

fn gzip(router: Router<AppState>, enabled: bool) -> Router<AppState> {
    if enabled {
        router.layer(CompressionLayer::new().gzip(true))
    } else {
        router
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let compression = state.config.http.compression_gzip;
    let admin_prefix = state
        .config
        .server
        .admin_path_prefix
        .trim_end_matches('/')
        .to_string();

    let api_routes = Router::new()
        // Health check
        .route("/v1/health", get(handlers::health_check))
        // Domain lookups for the request
        .route("/v1/domains", get(handlers::list_domains))
        .route("/v1/domains/current", get(handlers::get_current_domain))
        .route("/v1/domains/{reference}", get(handlers::get_domain))
        .route(
            "/v1/domains/{reference}/env/{env}",
            get(handlers::get_domain_by_env),
        )
        .route(
            "/v1/domains/{reference}/translations",
            get(handlers::get_domain_translations),
        );

    let admin_routes = Router::new()
        .route(
            &format!("{admin_prefix}/v1/domains"),
            get(handlers::admin_list_domains).post(handlers::create_domain),
        )
        .route(
            &format!("{admin_prefix}/v1/domains/{{domain_id}}"),
            get(handlers::admin_get_domain)
                .put(handlers::update_domain)
                .delete(handlers::delete_domain),
        )
        .route(
            &format!("{admin_prefix}/v1/entities/{{kind}}/{{entity_id}}/attach"),
            post(handlers::attach_entity),
        )
        .route(
            &format!("{admin_prefix}/v1/attachments/migrate"),
            post(handlers::migrate_attachments_handler),
        );

    // Everything outside the API and the admin area is a website page.
    let website_routes = Router::new().fallback(handlers::website_context);

    let router = Router::new()
        .merge(gzip(api_routes, compression.other))
        .merge(gzip(admin_routes, compression.admin))
        .merge(gzip(website_routes, compression.website))
        // Domain resolution runs before every handler, including the fallback.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            domain_middleware,
        ));

    let router = if state.config.server.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}
