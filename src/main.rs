// src/main.rs

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Deklaracje modułów
mod auth;
mod auth_models;
mod cart_utils;
mod email_service;
mod errors;
mod extractor;
mod filters;
mod handlers;
mod middleware;
mod models;
mod pagination;
mod pricing;
mod state;

use crate::handlers::*;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Inicjalizacja systemu logowania (tracing)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "urban_edge_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Inicjalizacja serwera...");

    // --- Połączenie z bazą danych ---
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Pomyślnie połączono z bazą danych");
            pool
        }
        Err(err) => {
            tracing::error!("Nie można połączyć z bazą danych: {:?}", err);
            std::process::exit(1);
        }
    };

    // --- Konfiguracja JWT ---
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let jwt_expiration_hours = env::var("JWT_EXPIRATION_HOURS")
        .unwrap_or_else(|_| "24".to_string())
        .parse::<i64>()
        .expect("JWT_EXPIRATION_HOURS must be a valid number");

    // --- Konfiguracja wysyłki e-maili ---
    let resend_api_key = env::var("RESEND_API_KEY").expect("RESEND_API_KEY must be set");
    let admin_email = env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL must be set");

    let app_state = Arc::new(AppState {
        db_pool: pool,
        jwt_secret,
        jwt_expiration_hours,
        resend_api_key,
        admin_email,
    });

    // Definicja routingu aplikacji
    let app = Router::new()
        // Rejestracja i logowanie
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        // Konto użytkownika
        .route(
            "/api/users/me",
            get(get_me_handler).put(update_profile_handler),
        )
        .route("/api/users/me/address", put(update_address_handler))
        .route(
            "/api/users/me/payment-method",
            put(update_payment_method_handler),
        )
        // Katalog produktów
        .route(
            "/api/products",
            get(list_products_handler).post(create_product_handler),
        )
        .route("/api/products/latest", get(get_latest_products_handler))
        .route("/api/products/categories", get(list_categories_handler))
        .route("/api/products/slug/{slug}", get(get_product_by_slug_handler))
        .route(
            "/api/products/{id}",
            get(get_product_handler)
                .patch(update_product_handler)
                .delete(delete_product_handler),
        )
        // Recenzje
        .route(
            "/api/products/{id}/reviews",
            get(list_reviews_handler).post(upsert_review_handler),
        )
        .route("/api/products/{id}/reviews/mine", get(my_review_handler))
        // Koszyk
        .route("/api/cart", get(get_cart_handler))
        .route("/api/cart/session", post(init_cart_session_handler))
        .route("/api/cart/count", get(get_cart_count_handler))
        .route("/api/cart/items", post(add_to_cart_handler))
        .route(
            "/api/cart/items/{product_id}",
            delete(remove_from_cart_handler),
        )
        .route("/api/cart/merge", post(merge_cart_handler))
        // Zamówienia
        .route("/api/orders", post(create_order_handler))
        .route("/api/orders/mine", get(my_orders_handler))
        .route("/api/orders/{order_id}", get(get_order_handler))
        .route("/api/orders/{order_id}/pay", put(mark_order_paid_handler))
        .route(
            "/api/orders/{order_id}/deliver",
            put(mark_order_delivered_handler),
        )
        // Panel admina
        .route("/api/admin/orders", get(list_orders_handler))
        .route("/api/admin/orders/{order_id}", delete(delete_order_handler))
        .route("/api/admin/summary", get(order_summary_handler))
        .route("/api/admin/users", get(list_users_handler))
        .route(
            "/api/admin/users/{user_id}",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Serwer nasłuchuje na {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Nie można powiązać adresu {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("Błąd serwera: {}", e);
    }
}
