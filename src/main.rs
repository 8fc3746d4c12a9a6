// region:    --- Imports
use crate::database::DatabaseManager;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod accounts;
mod auction;
mod bidding;
mod database;
mod errors;
mod handlers;
mod listing_store;
mod query;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route(
            "/",
            get(handlers::handle_index).post(handlers::handle_index),
        )
        .route(
            "/login",
            get(handlers::handle_login_page).post(handlers::handle_login),
        )
        .route("/logout", get(handlers::handle_logout))
        .route(
            "/register",
            get(handlers::handle_register_page).post(handlers::handle_register),
        )
        .route(
            "/create",
            get(handlers::handle_create_page).post(handlers::handle_create),
        )
        .route(
            "/listing/:id",
            get(handlers::handle_listing_page).post(handlers::handle_listing_action),
        )
        .route("/watchlist", get(handlers::handle_watchlist))
        .route("/my_listings", get(handlers::handle_my_listings))
        .route("/categories", get(handlers::handle_categories))
        .route(
            "/categories/:category",
            get(handlers::handle_category_listings),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // JSON 폼이므로 1MB 면 충분
        .with_state(db_manager);

    // 리스너 생성 (기본: 로컬 호스트의 3000번 포트)
    let listen_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&listen_addr).await.unwrap();
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr().unwrap()
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
