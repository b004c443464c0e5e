pub mod analytics;
pub mod auth;
pub mod badges;
pub mod coins;
pub mod communities;
pub mod error;
pub mod middleware;
pub mod notes;
pub mod pagination;
pub mod policy;
pub mod posts;
pub mod ratings;
pub mod state;
pub mod throttle;
pub mod users;
pub mod validate;
pub mod votes;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub use state::{ApiSettings, AppState, AppStateInner};

/// All HTTP routes. Token endpoints and `/health` are public; everything
/// else under `/api` requires an access token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/token/", post(auth::obtain_token))
        .route("/token/refresh/", post(auth::refresh_token))
        .route("/token/verify/", post(auth::verify_token));

    let protected_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::me))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/coins", get(coins::list_coins).post(coins::create_coin))
        .route(
            "/coins/{id}",
            get(coins::get_coin).put(coins::update_coin).delete(coins::delete_coin),
        )
        .route("/votes", get(votes::list_votes).post(votes::cast_vote))
        .route(
            "/votes/{id}",
            get(votes::get_vote).put(votes::update_vote).delete(votes::delete_vote),
        )
        .route(
            "/communities",
            get(communities::list_communities).post(communities::create_community),
        )
        .route(
            "/communities/{id}",
            get(communities::get_community)
                .put(communities::update_community)
                .delete(communities::delete_community),
        )
        .route("/communities/{id}/join", post(communities::join_community))
        .route("/communities/{id}/leave", post(communities::leave_community))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post).put(posts::update_post).delete(posts::delete_post),
        )
        .route("/comments", get(posts::list_comments).post(posts::create_comment))
        .route(
            "/comments/{id}",
            get(posts::get_comment)
                .put(posts::update_comment)
                .delete(posts::delete_comment),
        )
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/{id}",
            get(notes::get_note).put(notes::update_note).delete(notes::delete_note),
        )
        .route("/ratings", get(ratings::list_ratings).post(ratings::create_rating))
        .route(
            "/ratings/{id}",
            get(ratings::get_rating)
                .put(ratings::update_rating)
                .delete(ratings::delete_rating),
        )
        .route("/badges", get(badges::list_badges).post(badges::create_badge))
        .route(
            "/badges/{id}",
            get(badges::get_badge).put(badges::update_badge).delete(badges::delete_badge),
        )
        .route(
            "/user-badges",
            get(badges::list_user_badges).post(badges::create_user_badge),
        )
        .route(
            "/user-badges/{id}",
            get(badges::get_user_badge)
                .put(badges::update_user_badge)
                .delete(badges::delete_user_badge),
        )
        .route(
            "/notifications",
            get(notes::list_notifications).post(notes::create_notification),
        )
        .route(
            "/notifications/{id}",
            get(notes::get_notification)
                .put(notes::update_notification)
                .delete(notes::delete_notification),
        )
        .route(
            "/analytics",
            get(analytics::list_analytics).post(analytics::create_analytics),
        )
        .route(
            "/analytics/{id}",
            get(analytics::get_analytics)
                .put(analytics::update_analytics)
                .delete(analytics::delete_analytics),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let api = public_routes.merge(protected_routes);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api", api)
        .with_state(state)
}
