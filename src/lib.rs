use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod views;

pub mod crypto {
    pub mod csrf;
    pub mod password;
}

pub mod models {
    pub mod booking;
    pub mod movie;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod booking;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod booking;
    pub mod notify;
    pub mod session;
}

pub mod handlers {
    pub mod auth;
    pub mod booking;
    pub mod operator;
    pub mod pages;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod operator;
}

pub mod validation {
    pub mod auth;
    pub mod booking;
}

pub use state::AppState;

/// Builds the full HTTP application over `state`.
pub fn app(state: AppState) -> Router {
    let public_routes: Router = Router::new()
        .route("/", get(handlers::pages::index))
        .route(
            "/register",
            get(handlers::auth::register_page).post(handlers::auth::register),
        )
        .route(
            "/login",
            get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route("/logout", get(handlers::auth::logout))
        .with_state(state.clone());

    let booking_routes: Router = Router::new()
        .route("/home", get(handlers::pages::home))
        .route(
            "/booking",
            get(handlers::booking::booking_page).post(handlers::booking::submit_booking),
        )
        .route(
            "/payment",
            get(handlers::booking::payment_page).post(handlers::booking::submit_payment),
        )
        .route("/confirmation", get(handlers::booking::confirmation))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let mut router = Router::new().merge(public_routes).merge(booking_routes);

    if state.config.operator_token.is_some() {
        let operator_routes: Router = Router::new()
            .route("/debug/bookings", get(handlers::operator::list_bookings))
            .route_layer(from_fn_with_state(
                state.clone(),
                middleware_layer::operator::require_operator,
            ))
            .with_state(state.clone());
        router = router.merge(operator_routes);
    } else {
        tracing::info!("Operator endpoints disabled (OPERATOR_TOKEN unset)");
    }

    router
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
}
