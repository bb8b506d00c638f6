mod extractors;
mod middleware;
mod models;
mod repository;
mod routes;
mod structs;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Router};
use hyper::header::HeaderValue;
use hyper::http::Method;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tracing::info;

use middleware::logger_middleware::logger_middleware;
use repository::feed::FeedAssembler;
use repository::post_repository::PostRepository;
use routes::comment_post_route::comment_post_route;
use routes::get_posts::{get_account_posts_route, get_my_posts_route, get_posts_route};
use routes::like_post_route::like_post_route;
use routes::login_route::login_route;
use routes::publish_post::publish_post_route;
use routes::register_route::register_route;

pub struct AppState {
    pool: PgPool,
    posts: PostRepository,
    feed: FeedAssembler,
}

// Images arrive inline-encoded in the post payload.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await
        .expect("Failed to connect to the database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let app_state = Arc::new(AppState {
        pool: pool.clone(),
        posts: PostRepository::new(pool.clone()),
        feed: FeedAssembler::new(pool),
    });

    let front_url =
        std::env::var("FRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([hyper::header::CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(
            front_url
                .parse::<HeaderValue>()
                .expect("Invalid FRONT_URL value"),
        );

    let router = Router::new()
        .route("/register", post(register_route))
        .route("/login", post(login_route))
        .route("/posts", post(publish_post_route).get(get_posts_route))
        .route("/posts/me", get(get_my_posts_route))
        .route("/posts/user/:account_id", get(get_account_posts_route))
        .route("/posts/:post_id/like", post(like_post_route))
        .route("/posts/:post_id/comment", post(comment_post_route))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .layer(axum_middleware::from_fn(logger_middleware))
        .with_state(app_state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(5000u16);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Listening on {addr}");

    axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .await
        .expect("Server error");
}
