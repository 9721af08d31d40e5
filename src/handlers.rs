// src/handlers.rs

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{Value, json};
use sqlx::{Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{create_jwt, hash_password, verify_password};
use crate::auth_models::{LoginPayload, RegistrationPayload, TokenClaims};
use crate::cart_utils::{
    self, CartAddition, CartRemoval, build_cart_details_response, find_cart, find_cart_for_update,
    merge_session_cart_into_user_cart, plan_cart_addition, plan_cart_removal,
    recalculate_cart_prices,
};
use crate::email_service::send_purchase_receipt;
use crate::errors::AppError;
use crate::extractor::{OptionalTokenClaims, SESSION_CART_COOKIE, SessionCartId};
use crate::filters::{AdminListingParams, ListingParams};
use crate::middleware::require_admin;
use crate::models::*;
use crate::pagination::PaginatedResponse;
use crate::pricing::{self, PricingItem};
use crate::state::AppState;

const LATEST_PRODUCTS_LIMIT: i64 = 4;
const SUMMARY_LATEST_SALES_LIMIT: i64 = 6;

// ===========================================================================
// REJESTRACJA I LOGOWANIE
// ===========================================================================

pub async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegistrationPayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;

    let password_hash = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(payload.email.to_lowercase())
    .bind(&password_hash)
    .fetch_one(&app_state.db_pool)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::EmailAlreadyExists(
                    "Konto z tym adresem email już istnieje".to_string(),
                );
            }
        }
        AppError::SqlxError(e)
    })?;

    tracing::info!("Zarejestrowano nowego użytkownika: {}", user.id);

    let token = create_jwt(
        user.id,
        user.role,
        &app_state.jwt_secret,
        app_state.jwt_expiration_hours,
    )?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": UserPublic::from(user),
    })))
}

/// Logowanie. Jeśli klient ma koszyk sesji, zostaje on w tej samej
/// transakcji scalony z koszykiem użytkownika, a ciasteczko sesji usunięte.
pub async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    SessionCartId(session_cart_id): SessionCartId,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.to_lowercase())
        .fetch_optional(&app_state.db_pool)
        .await?
        .ok_or(AppError::InvalidLoginCredentials)?;

    if !verify_password(&user.password_hash, &payload.password)? {
        tracing::warn!("Nieudana próba logowania dla: {}", payload.email);
        return Err(AppError::InvalidLoginCredentials);
    }

    if let Some(session_cart_id) = session_cart_id {
        let mut tx = app_state.db_pool.begin().await?;
        merge_session_cart_into_user_cart(&mut tx, session_cart_id, user.id).await?;
        tx.commit().await?;
    }

    let token = create_jwt(
        user.id,
        user.role,
        &app_state.jwt_secret,
        app_state.jwt_expiration_hours,
    )?;

    tracing::info!("Zalogowano użytkownika: {}", user.id);

    let jar = jar.remove(Cookie::build((SESSION_CART_COOKIE, "")).path("/").build());

    Ok((
        jar,
        Json(json!({
            "success": true,
            "token": token,
            "user": UserPublic::from(user),
        })),
    ))
}

/// Inicjuje sesję koszyka gościa: generuje identyfikator i zapisuje go
/// w ciasteczku. Sam koszyk powstaje leniwie przy pierwszym dodaniu produktu.
pub async fn init_cart_session_handler(jar: CookieJar) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = jar.get(SESSION_CART_COOKIE) {
        if let Ok(existing) = Uuid::parse_str(cookie.value()) {
            return Ok((jar, Json(json!({ "session_cart_id": existing }))));
        }
    }

    let session_cart_id = Uuid::new_v4();
    let cookie = Cookie::build((SESSION_CART_COOKIE, session_cart_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(30))
        .build();

    Ok((jar.add(cookie), Json(json!({ "session_cart_id": session_cart_id }))))
}

// ===========================================================================
// KONTO UŻYTKOWNIKA
// ===========================================================================

pub async fn get_me_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
) -> Result<Json<UserPublic>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&app_state.db_pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

pub async fn update_profile_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<UserPublic>, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET name = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(&payload.name)
    .bind(claims.sub)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

pub async fn update_address_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Json(payload): Json<ShippingAddress>,
) -> Result<Json<UserPublic>, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        r#"
            UPDATE users
            SET address_full_name = $1,
                address_street = $2,
                address_city = $3,
                address_postal_code = $4,
                address_country = $5,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $6
            RETURNING *
        "#,
    )
    .bind(&payload.full_name)
    .bind(&payload.street_address)
    .bind(&payload.city)
    .bind(&payload.postal_code)
    .bind(&payload.country)
    .bind(claims.sub)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

pub async fn update_payment_method_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Json(payload): Json<UpdatePaymentMethodPayload>,
) -> Result<Json<UserPublic>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET payment_method = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(payload.payment_method)
    .bind(claims.sub)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

// ===========================================================================
// KATALOG PRODUKTÓW
// ===========================================================================

#[derive(sqlx::FromRow)]
struct ProductWithTotalCount {
    #[sqlx(flatten)]
    product: Product,
    total_count: i64,
}

pub async fn list_products_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListingParams>,
) -> Result<Json<PaginatedResponse<Product>>, AppError> {
    tracing::debug!("GET /api/products z parametrami: {:?}", params);

    let limit = params.limit();
    let offset = params.offset();

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT p.*, COUNT(*) OVER() AS total_count FROM products p");

    let mut conditions_added = false;
    let mut append_where_or_and = |builder: &mut QueryBuilder<Postgres>| {
        if !conditions_added {
            builder.push(" WHERE ");
            conditions_added = true;
        } else {
            builder.push(" AND ");
        }
    };

    match params.status() {
        Some(status) => {
            append_where_or_and(&mut query_builder);
            query_builder.push("status = ").push_bind(status);
        }
        None => {
            // Domyślnie katalog nie pokazuje produktów wycofanych
            append_where_or_and(&mut query_builder);
            query_builder.push("status <> 'discontinued'");
        }
    }
    if let Some(category) = params.category() {
        append_where_or_and(&mut query_builder);
        query_builder
            .push_bind(category.to_string())
            .push(" = ANY(category)");
    }
    if let Some(target_audience) = params.target_audience() {
        append_where_or_and(&mut query_builder);
        query_builder
            .push("target_audience = ")
            .push_bind(target_audience);
    }
    if let Some(price_min) = params.price_min() {
        append_where_or_and(&mut query_builder);
        query_builder.push("price >= ").push_bind(price_min);
    }
    if let Some(price_max) = params.price_max() {
        append_where_or_and(&mut query_builder);
        query_builder.push("price <= ").push_bind(price_max);
    }
    if let Some(rating_min) = params.rating_min() {
        append_where_or_and(&mut query_builder);
        query_builder.push("rating >= ").push_bind(rating_min);
    }
    if let Some(search_term) = params.q() {
        append_where_or_and(&mut query_builder);
        let like_pattern = format!("%{}%", search_term);
        query_builder
            .push("(name ILIKE ")
            .push_bind(like_pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(like_pattern)
            .push(")");
    }

    query_builder.push(format!(
        " ORDER BY {} {}, id ASC",
        params.sort_by(),
        params.order()
    ));
    query_builder.push(" LIMIT ").push_bind(limit);
    query_builder.push(" OFFSET ").push_bind(offset);

    let rows: Vec<ProductWithTotalCount> = query_builder
        .build_query_as()
        .fetch_all(&app_state.db_pool)
        .await?;

    let total_items = rows.first().map_or(0, |row| row.total_count);
    let products: Vec<Product> = rows.into_iter().map(|row| row.product).collect();

    Ok(Json(PaginatedResponse::new(
        products,
        total_items,
        limit,
        offset,
    )))
}

pub async fn get_latest_products_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE status <> 'discontinued' ORDER BY created_at DESC LIMIT $1",
    )
    .bind(LATEST_PRODUCTS_LIMIT)
    .fetch_all(&app_state.db_pool)
    .await?;

    Ok(Json(products))
}

pub async fn get_product_handler(
    State(app_state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&app_state.db_pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(product))
}

pub async fn get_product_by_slug_handler(
    State(app_state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&app_state.db_pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(product))
}

/// Lista unikalnych kategorii występujących w katalogu wraz z liczbą produktów.
pub async fn list_categories_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryCount>>, AppError> {
    let categories = sqlx::query_as::<_, CategoryCount>(
        r#"
            SELECT unnest(category) AS category, COUNT(*) AS count
            FROM products
            WHERE status <> 'discontinued'
            GROUP BY 1
            ORDER BY 1
        "#,
    )
    .fetch_all(&app_state.db_pool)
    .await?;

    Ok(Json(categories))
}

// ===========================================================================
// PRODUKTY: PANEL ADMINA
// ===========================================================================

pub async fn create_product_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Json(payload): Json<CreateProductPayload>,
) -> Result<Json<Product>, AppError> {
    require_admin(&claims)?;
    payload.validate()?;

    let status = payload.status.unwrap_or(ProductStatus::InStock);

    let product = sqlx::query_as::<_, Product>(
        r#"
            INSERT INTO products (
                name, slug, description, images, category, target_audience,
                price, discount_percent, stock, status, color, material, size,
                is_new, best_seller
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.slug)
    .bind(&payload.description)
    .bind(&payload.images)
    .bind(&payload.category)
    .bind(payload.target_audience)
    .bind(payload.price)
    .bind(payload.discount_percent)
    .bind(payload.stock)
    .bind(status)
    .bind(&payload.color)
    .bind(&payload.material)
    .bind(&payload.size)
    .bind(payload.is_new)
    .bind(payload.best_seller)
    .fetch_one(&app_state.db_pool)
    .await?;

    tracing::info!("Utworzono produkt {} ({})", product.name, product.id);
    Ok(Json(product))
}

/// Częściowa aktualizacja produktu: zmieniane są tylko przekazane pola.
pub async fn update_product_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    require_admin(&claims)?;

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP");

    if let Some(name) = payload.name {
        query_builder.push(", name = ").push_bind(name);
    }
    if let Some(slug) = payload.slug {
        query_builder.push(", slug = ").push_bind(slug);
    }
    if let Some(description) = payload.description {
        query_builder.push(", description = ").push_bind(description);
    }
    if let Some(images) = payload.images {
        query_builder.push(", images = ").push_bind(images);
    }
    if let Some(category) = payload.category {
        query_builder.push(", category = ").push_bind(category);
    }
    if let Some(target_audience) = payload.target_audience {
        query_builder
            .push(", target_audience = ")
            .push_bind(target_audience);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::UnprocessableEntity(
                "Cena nie może być ujemna".to_string(),
            ));
        }
        query_builder.push(", price = ").push_bind(price);
    }
    if let Some(discount_percent) = payload.discount_percent {
        if let Some(percent) = discount_percent {
            if !(0..=100).contains(&percent) {
                return Err(AppError::UnprocessableEntity(
                    "Rabat musi być w zakresie 0-100".to_string(),
                ));
            }
        }
        query_builder
            .push(", discount_percent = ")
            .push_bind(discount_percent);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::UnprocessableEntity(
                "Stan magazynowy nie może być ujemny".to_string(),
            ));
        }
        query_builder.push(", stock = ").push_bind(stock);
    }
    if let Some(status) = payload.status {
        query_builder.push(", status = ").push_bind(status);
    }
    if let Some(color) = payload.color {
        query_builder.push(", color = ").push_bind(color);
    }
    if let Some(material) = payload.material {
        query_builder.push(", material = ").push_bind(material);
    }
    if let Some(size) = payload.size {
        query_builder.push(", size = ").push_bind(size);
    }
    if let Some(is_new) = payload.is_new {
        query_builder.push(", is_new = ").push_bind(is_new);
    }
    if let Some(best_seller) = payload.best_seller {
        query_builder.push(", best_seller = ").push_bind(best_seller);
    }

    query_builder
        .push(" WHERE id = ")
        .push_bind(product_id)
        .push(" RETURNING *");

    let product: Product = query_builder
        .build_query_as()
        .fetch_optional(&app_state.db_pool)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("Zaktualizowano produkt {}", product.id);
    Ok(Json(product))
}

pub async fn delete_product_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(product_id): Path<Uuid>,
) -> Result<Json<OperationResponse>, AppError> {
    require_admin(&claims)?;

    let referenced: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM order_items WHERE product_id = $1)")
            .bind(product_id)
            .fetch_one(&app_state.db_pool)
            .await?;

    if referenced {
        // Produkt występuje w historii zamówień, zamiast usuwać wycofujemy go
        return Err(AppError::Conflict(
            "Produkt jest powiązany z zamówieniami, oznacz go jako wycofany".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(&app_state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!("Usunięto produkt {}", product_id);
    Ok(Json(OperationResponse::ok("Produkt został usunięty")))
}

// ===========================================================================
// KOSZYK
// ===========================================================================

pub async fn get_cart_handler(
    State(app_state): State<Arc<AppState>>,
    OptionalTokenClaims(claims): OptionalTokenClaims,
    SessionCartId(session_cart_id): SessionCartId,
) -> Result<Json<Option<CartDetailsResponse>>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;
    let user_id = claims.map(|c| c.sub);

    match find_cart(&mut conn, user_id, session_cart_id).await? {
        Some(cart) => {
            let details = build_cart_details_response(&mut conn, &cart).await?;
            Ok(Json(Some(details)))
        }
        None => Ok(Json(None)),
    }
}

pub async fn get_cart_count_handler(
    State(app_state): State<Arc<AppState>>,
    OptionalTokenClaims(claims): OptionalTokenClaims,
    SessionCartId(session_cart_id): SessionCartId,
) -> Result<Json<Value>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;
    let user_id = claims.map(|c| c.sub);

    let count: i64 = match find_cart(&mut conn, user_id, session_cart_id).await? {
        Some(cart) => sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE cart_id = $1",
        )
        .bind(cart.id)
        .fetch_one(&mut *conn)
        .await?,
        None => 0,
    };

    Ok(Json(json!({ "count": count })))
}

pub async fn add_to_cart_handler(
    State(app_state): State<Arc<AppState>>,
    OptionalTokenClaims(claims): OptionalTokenClaims,
    SessionCartId(session_cart_id): SessionCartId,
    Json(payload): Json<AddItemToCartPayload>,
) -> Result<Json<OperationResponse>, AppError> {
    let user_id = claims.map(|c| c.sub);

    if user_id.is_none() && session_cart_id.is_none() {
        return Err(AppError::BadRequest(
            "Brak aktywnej sesji koszyka".to_string(),
        ));
    }

    let mut tx = app_state.db_pool.begin().await?;

    // Blokada wiersza produktu chroni stan magazynowy przy równoległych dodaniach
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
        .bind(payload.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(size) = payload.size {
        if !product.size.contains(&size) {
            return Err(AppError::UnprocessableEntity(format!(
                "Produkt {} nie jest dostępny w rozmiarze {}",
                product.name, size
            )));
        }
    }

    let cart = match find_cart(&mut tx, user_id, session_cart_id).await? {
        Some(cart) => cart,
        None => {
            sqlx::query_as::<_, Cart>(
                "INSERT INTO carts (user_id, session_cart_id) VALUES ($1, $2) RETURNING *",
            )
            .bind(user_id)
            .bind(if user_id.is_none() {
                session_cart_id
            } else {
                None
            })
            .fetch_one(&mut *tx)
            .await?
        }
    };

    let existing_items =
        sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE cart_id = $1 FOR UPDATE")
            .bind(cart.id)
            .fetch_all(&mut *tx)
            .await?;

    match plan_cart_addition(
        &existing_items,
        &product,
        &payload.color,
        &payload.size,
        payload.quantity,
    )? {
        CartAddition::Increment {
            item_id,
            new_quantity,
        } => {
            sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2")
                .bind(new_quantity)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }
        CartAddition::Insert { quantity } => {
            sqlx::query(
                r#"
                    INSERT INTO cart_items (cart_id, product_id, quantity, color, size)
                    VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(cart.id)
            .bind(product.id)
            .bind(quantity)
            .bind(&payload.color)
            .bind(payload.size)
            .execute(&mut *tx)
            .await?;
        }
    }

    recalculate_cart_prices(&mut tx, cart.id).await?;
    tx.commit().await?;

    Ok(Json(OperationResponse::ok(format!(
        "Dodano {} do koszyka",
        product.name
    ))))
}

pub async fn remove_from_cart_handler(
    State(app_state): State<Arc<AppState>>,
    OptionalTokenClaims(claims): OptionalTokenClaims,
    SessionCartId(session_cart_id): SessionCartId,
    Path(product_id): Path<Uuid>,
    Query(params): Query<RemoveItemParams>,
) -> Result<Json<OperationResponse>, AppError> {
    let user_id = claims.map(|c| c.sub);

    let mut tx = app_state.db_pool.begin().await?;

    let cart = find_cart(&mut tx, user_id, session_cart_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let items =
        sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE cart_id = $1 FOR UPDATE")
            .bind(cart.id)
            .fetch_all(&mut *tx)
            .await?;

    let item = items
        .iter()
        .find(|item| item.matches(product_id, &params.color, &params.size))
        .ok_or(AppError::NotFound)?;

    let message = match plan_cart_removal(item, params.remove_all) {
        CartRemoval::Delete { item_id } => {
            sqlx::query("DELETE FROM cart_items WHERE id = $1")
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
            "Usunięto pozycję z koszyka"
        }
        CartRemoval::Decrement {
            item_id,
            new_quantity,
        } => {
            sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2")
                .bind(new_quantity)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
            "Zmniejszono ilość w koszyku"
        }
    };

    recalculate_cart_prices(&mut tx, cart.id).await?;
    tx.commit().await?;

    Ok(Json(OperationResponse::ok(message)))
}

/// Jawne scalenie koszyka sesji z koszykiem zalogowanego użytkownika,
/// dla klientów trzymających identyfikator sesji poza ciasteczkiem.
pub async fn merge_cart_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    jar: CookieJar,
    Json(payload): Json<MergeCartPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = app_state.db_pool.begin().await?;
    merge_session_cart_into_user_cart(&mut tx, payload.session_cart_id, claims.sub).await?;
    tx.commit().await?;

    let jar = jar.remove(Cookie::build((SESSION_CART_COOKIE, "")).path("/").build());

    Ok((jar, Json(OperationResponse::ok("Koszyki zostały scalone"))))
}

// ===========================================================================
// ZAMÓWIENIA
// ===========================================================================

async fn fetch_order_details(
    conn: &mut sqlx::PgConnection,
    order_id: Uuid,
) -> Result<OrderDetailsResponse, AppError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY name ASC",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let user_row: Option<(String, String)> =
        sqlx::query_as("SELECT name, email FROM users WHERE id = $1")
            .bind(order.user_id)
            .fetch_optional(&mut *conn)
            .await?;
    let (user_name, user_email) = match user_row {
        Some((name, email)) => (Some(name), Some(email)),
        None => (None, None),
    };

    Ok(OrderDetailsResponse {
        order,
        items,
        user_name,
        user_email,
    })
}

/// Składa zamówienie z koszyka zalogowanego użytkownika.
///
/// Braki w warunkach wstępnych (pusty koszyk, brak adresu, brak metody
/// płatności) nie są błędami HTTP: zwracamy success=false z adresem
/// przekierowania, którym zajmuje się klient.
pub async fn create_order_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    SessionCartId(session_cart_id): SessionCartId,
) -> Result<Json<OperationResponse>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&app_state.db_pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut tx = app_state.db_pool.begin().await?;

    // Ta sama kolejność wyszukiwania co przy odczycie koszyka: koszyk
    // użytkownika, a w razie braku koszyk sesji sprzed scalenia.
    let cart = match find_cart_for_update(&mut tx, Some(user.id), session_cart_id).await? {
        Some(cart) => cart,
        None => {
            return Ok(Json(OperationResponse::fail_with_redirect(
                "Twój koszyk jest pusty",
                "/cart",
            )));
        }
    };

    // Blokujemy produkty z koszyka, żeby ceny i stany nie zmieniły się
    // między wyceną a zapisem migawki.
    sqlx::query(
        r#"
            SELECT id FROM products
            WHERE id IN (SELECT product_id FROM cart_items WHERE cart_id = $1)
            FOR UPDATE
        "#,
    )
    .bind(cart.id)
    .execute(&mut *tx)
    .await?;

    let items = cart_utils::fetch_cart_items_with_products(&mut tx, cart.id).await?;

    if items.is_empty() {
        return Ok(Json(OperationResponse::fail_with_redirect(
            "Twój koszyk jest pusty",
            "/cart",
        )));
    }

    let address = match user.shipping_address() {
        Some(address) => address,
        None => {
            return Ok(Json(OperationResponse::fail_with_redirect(
                "Brak adresu wysyłki",
                "/shipping-address",
            )));
        }
    };

    let payment_method = match user.payment_method {
        Some(method) => method,
        None => {
            return Ok(Json(OperationResponse::fail_with_redirect(
                "Brak wybranej metody płatności",
                "/payment-method",
            )));
        }
    };

    for item in &items {
        if item.quantity > item.stock {
            return Ok(Json(OperationResponse::fail_with_redirect(
                format!("Niewystarczający stan magazynowy dla {}", item.name),
                "/cart",
            )));
        }
    }

    let pricing_items: Vec<PricingItem> = items
        .iter()
        .map(|item| PricingItem {
            unit_price: item.price,
            discount_percent: item.discount_percent,
            quantity: item.quantity,
        })
        .collect();
    let prices = pricing::calculate_cart_prices(&pricing_items);

    let order_id: Uuid = sqlx::query_scalar(
        r#"
            INSERT INTO orders (
                user_id, shipping_full_name, shipping_street_address, shipping_city,
                shipping_postal_code, shipping_country, payment_method,
                items_price, shipping_price, tax_price, total_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(&address.full_name)
    .bind(&address.street_address)
    .bind(&address.city)
    .bind(&address.postal_code)
    .bind(&address.country)
    .bind(payment_method)
    .bind(prices.items_price)
    .bind(prices.shipping_price)
    .bind(prices.tax_price)
    .bind(prices.total_price)
    .fetch_one(&mut *tx)
    .await?;

    for item in &items {
        // Migawka: cena efektywna z chwili zakupu, suma pozycji = items_price
        let unit_price = pricing::discounted_unit_price(item.price, item.discount_percent);
        sqlx::query(
            r#"
                INSERT INTO order_items (
                    order_id, product_id, quantity, price, name, slug, image, color, size
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(unit_price)
        .bind(&item.name)
        .bind(&item.slug)
        .bind(item.images.first().cloned().unwrap_or_default())
        .bind(&item.color)
        .bind(item.size)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
            UPDATE carts
            SET items_price = 0, shipping_price = 0, tax_price = 0, total_price = 0,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
        "#,
    )
    .bind(cart.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Utworzono zamówienie {} użytkownika {} na kwotę {} gr",
        order_id,
        user.id,
        prices.total_price
    );

    Ok(Json(OperationResponse::ok_with_redirect(
        "Zamówienie zostało złożone",
        format!("/order/{}", order_id),
    )))
}

pub async fn get_order_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetailsResponse>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;
    let details = fetch_order_details(&mut conn, order_id).await?;

    if details.order.user_id != claims.sub && !claims.is_admin() {
        return Err(AppError::UnauthorizedAccess(
            "To zamówienie należy do innego użytkownika".to_string(),
        ));
    }

    Ok(Json(details))
}

pub async fn my_orders_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Query(params): Query<AdminListingParams>,
) -> Result<Json<PaginatedResponse<Order>>, AppError> {
    let limit = params.limit();
    let offset = params.offset();

    let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(claims.sub)
        .fetch_one(&app_state.db_pool)
        .await?;

    let orders = sqlx::query_as::<_, Order>(
        r#"
            SELECT * FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
        "#,
    )
    .bind(claims.sub)
    .bind(limit)
    .bind(offset)
    .fetch_all(&app_state.db_pool)
    .await?;

    Ok(Json(PaginatedResponse::new(
        orders,
        total_items,
        limit,
        offset,
    )))
}

pub async fn list_orders_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Query(params): Query<AdminListingParams>,
) -> Result<Json<PaginatedResponse<OrderWithCustomerInfo>>, AppError> {
    require_admin(&claims)?;

    let limit = params.limit();
    let offset = params.offset();

    let mut count_query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM orders o JOIN users u ON o.user_id = u.id");
    let mut data_query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
            SELECT o.*, u.name AS user_name, u.email AS user_email
            FROM orders o
            JOIN users u ON o.user_id = u.id
        "#,
    );

    if let Some(search_term) = params.q() {
        let like_pattern = format!("%{}%", search_term);
        count_query_builder
            .push(" WHERE (u.name ILIKE ")
            .push_bind(like_pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(like_pattern.clone())
            .push(")");
        data_query_builder
            .push(" WHERE (u.name ILIKE ")
            .push_bind(like_pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(like_pattern)
            .push(")");
    }

    data_query_builder.push(" ORDER BY o.created_at DESC");
    data_query_builder.push(" LIMIT ").push_bind(limit);
    data_query_builder.push(" OFFSET ").push_bind(offset);

    let total_items: i64 = count_query_builder
        .build_query_scalar()
        .fetch_one(&app_state.db_pool)
        .await?;
    let orders: Vec<OrderWithCustomerInfo> = data_query_builder
        .build_query_as()
        .fetch_all(&app_state.db_pool)
        .await?;

    Ok(Json(PaginatedResponse::new(
        orders,
        total_items,
        limit,
        offset,
    )))
}

/// Oznacza zamówienie jako opłacone: zdejmuje stany magazynowe i zapisuje
/// wynik płatności. Operacja jest niepowtarzalna, drugi raz zwraca konflikt.
pub async fn mark_order_paid_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(order_id): Path<Uuid>,
    Json(payment_result): Json<PaymentResult>,
) -> Result<Json<OperationResponse>, AppError> {
    require_admin(&claims)?;

    let mut tx = app_state.db_pool.begin().await?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.is_paid {
        return Err(AppError::Conflict(
            "Zamówienie jest już opłacone".to_string(),
        ));
    }

    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

    for item in &items {
        let result = sqlx::query(
            r#"
                UPDATE products
                SET stock = stock - $1,
                    status = CASE WHEN stock - $1 <= 0 THEN 'out_of_stock'::product_status ELSE status END,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $2 AND stock >= $1
            "#,
        )
        .bind(item.quantity)
        .bind(item.product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UnprocessableEntity(format!(
                "Niewystarczający stan magazynowy dla {}",
                item.name
            )));
        }
    }

    sqlx::query(
        r#"
            UPDATE orders
            SET is_paid = TRUE,
                paid_at = CURRENT_TIMESTAMP,
                payment_result = $1,
                status = 'processing',
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
        "#,
    )
    .bind(sqlx::types::Json(&payment_result))
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Zamówienie {} oznaczone jako opłacone", order_id);

    // Potwierdzenie wysyłamy po zatwierdzeniu transakcji, niepowodzenie
    // wysyłki nie cofa płatności.
    let app_state_clone = app_state.clone();
    tokio::spawn(async move {
        let details = match app_state_clone.db_pool.acquire().await {
            Ok(mut conn) => fetch_order_details(&mut conn, order_id).await,
            Err(e) => Err(AppError::SqlxError(e)),
        };
        match details {
            Ok(details) => {
                if let Err(e) = send_purchase_receipt(&app_state_clone, &details).await {
                    tracing::error!(
                        "Nie udało się wysłać potwierdzenia dla zamówienia {}: {:?}",
                        order_id,
                        e
                    );
                }
            }
            Err(e) => {
                tracing::error!(
                    "Nie udało się pobrać szczegółów zamówienia {} do wysyłki: {:?}",
                    order_id,
                    e
                );
            }
        }
    });

    Ok(Json(OperationResponse::ok(
        "Zamówienie oznaczone jako opłacone",
    )))
}

pub async fn mark_order_delivered_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OperationResponse>, AppError> {
    require_admin(&claims)?;

    let mut tx = app_state.db_pool.begin().await?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

    if !order.is_paid {
        return Err(AppError::BadRequest(
            "Zamówienie nie zostało jeszcze opłacone".to_string(),
        ));
    }
    if order.is_delivered {
        return Err(AppError::Conflict(
            "Zamówienie jest już dostarczone".to_string(),
        ));
    }

    sqlx::query(
        r#"
            UPDATE orders
            SET is_delivered = TRUE,
                delivered_at = CURRENT_TIMESTAMP,
                status = 'delivered',
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
        "#,
    )
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Zamówienie {} oznaczone jako dostarczone", order_id);
    Ok(Json(OperationResponse::ok(
        "Zamówienie oznaczone jako dostarczone",
    )))
}

pub async fn delete_order_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OperationResponse>, AppError> {
    require_admin(&claims)?;

    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(&app_state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!("Usunięto zamówienie {}", order_id);
    Ok(Json(OperationResponse::ok("Zamówienie zostało usunięte")))
}

/// Podsumowanie sprzedaży dla panelu admina.
pub async fn order_summary_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
) -> Result<Json<OrderSummaryResponse>, AppError> {
    require_admin(&claims)?;

    let orders_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&app_state.db_pool)
        .await?;
    let products_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&app_state.db_pool)
        .await?;
    let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&app_state.db_pool)
        .await?;
    let total_sales: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(total_price), 0)::BIGINT FROM orders")
            .fetch_one(&app_state.db_pool)
            .await?;

    let sales_rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
            SELECT to_char(created_at, 'MM/YY') AS month,
                   COALESCE(SUM(total_price), 0)::BIGINT AS total_sales
            FROM orders
            GROUP BY to_char(created_at, 'MM/YY')
            ORDER BY MIN(created_at)
        "#,
    )
    .fetch_all(&app_state.db_pool)
    .await?;
    let sales_data = sales_rows
        .into_iter()
        .map(|(month, total_sales)| MonthlySales { month, total_sales })
        .collect();

    let latest_sales: Vec<OrderWithCustomerInfo> = sqlx::query_as(
        r#"
            SELECT o.*, u.name AS user_name, u.email AS user_email
            FROM orders o
            JOIN users u ON o.user_id = u.id
            ORDER BY o.created_at DESC
            LIMIT $1
        "#,
    )
    .bind(SUMMARY_LATEST_SALES_LIMIT)
    .fetch_all(&app_state.db_pool)
    .await?;

    Ok(Json(OrderSummaryResponse {
        orders_count,
        products_count,
        users_count,
        total_sales,
        sales_data,
        latest_sales,
    }))
}

// ===========================================================================
// RECENZJE
// ===========================================================================

/// Zapisuje recenzję użytkownika dla produktu. Jedna recenzja na parę
/// (użytkownik, produkt), ponowne wysłanie nadpisuje poprzednią.
/// Średnia ocen produktu jest przeliczana w tej samej transakcji.
pub async fn upsert_review_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpsertReviewPayload>,
) -> Result<Json<OperationResponse>, AppError> {
    payload.validate()?;

    let mut tx = app_state.db_pool.begin().await?;

    let product_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;
    if !product_exists {
        return Err(AppError::NotFound);
    }

    let is_verified_purchase: bool = sqlx::query_scalar(
        r#"
            SELECT EXISTS(
                SELECT 1 FROM order_items oi
                JOIN orders o ON oi.order_id = o.id
                WHERE o.user_id = $1 AND oi.product_id = $2 AND o.is_paid
            )
        "#,
    )
    .bind(claims.sub)
    .bind(product_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
            INSERT INTO reviews (user_id, product_id, rating, title, description, is_verified_purchase)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, product_id) DO UPDATE
            SET rating = EXCLUDED.rating,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                is_verified_purchase = EXCLUDED.is_verified_purchase,
                updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(claims.sub)
    .bind(product_id)
    .bind(payload.rating)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(is_verified_purchase)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
            UPDATE products
            SET rating = COALESCE(
                    (SELECT AVG(rating)::DOUBLE PRECISION FROM reviews WHERE product_id = $1), 0),
                num_reviews = (SELECT COUNT(*) FROM reviews WHERE product_id = $1),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
        "#,
    )
    .bind(product_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Zapisano recenzję produktu {} od użytkownika {}",
        product_id,
        claims.sub
    );
    Ok(Json(OperationResponse::ok("Recenzja została zapisana")))
}

pub async fn list_reviews_handler(
    State(app_state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewWithAuthor>>, AppError> {
    let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
        r#"
            SELECT r.*, u.name AS user_name
            FROM reviews r
            JOIN users u ON r.user_id = u.id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(&app_state.db_pool)
    .await?;

    Ok(Json(reviews))
}

pub async fn my_review_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Option<Review>>, AppError> {
    let review = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE user_id = $1 AND product_id = $2",
    )
    .bind(claims.sub)
    .bind(product_id)
    .fetch_optional(&app_state.db_pool)
    .await?;

    Ok(Json(review))
}

// ===========================================================================
// UŻYTKOWNICY: PANEL ADMINA
// ===========================================================================

pub async fn list_users_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Query(params): Query<AdminListingParams>,
) -> Result<Json<PaginatedResponse<UserPublic>>, AppError> {
    require_admin(&claims)?;

    let limit = params.limit();
    let offset = params.offset();

    let mut count_query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM users");
    let mut data_query_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM users");

    if let Some(search_term) = params.q() {
        let like_pattern = format!("%{}%", search_term);
        count_query_builder
            .push(" WHERE (name ILIKE ")
            .push_bind(like_pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(like_pattern.clone())
            .push(")");
        data_query_builder
            .push(" WHERE (name ILIKE ")
            .push_bind(like_pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(like_pattern)
            .push(")");
    }

    data_query_builder.push(" ORDER BY created_at DESC");
    data_query_builder.push(" LIMIT ").push_bind(limit);
    data_query_builder.push(" OFFSET ").push_bind(offset);

    let total_items: i64 = count_query_builder
        .build_query_scalar()
        .fetch_one(&app_state.db_pool)
        .await?;
    let users: Vec<User> = data_query_builder
        .build_query_as()
        .fetch_all(&app_state.db_pool)
        .await?;

    Ok(Json(PaginatedResponse::new(
        users.into_iter().map(UserPublic::from).collect(),
        total_items,
        limit,
        offset,
    )))
}

pub async fn get_user_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserPublic>, AppError> {
    require_admin(&claims)?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&app_state.db_pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

pub async fn update_user_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AdminUpdateUserPayload>,
) -> Result<Json<UserPublic>, AppError> {
    require_admin(&claims)?;
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET name = $1, role = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3 RETURNING *",
    )
    .bind(&payload.name)
    .bind(payload.role)
    .bind(user_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or(AppError::NotFound)?;

    tracing::info!("Zaktualizowano użytkownika {}", user.id);
    Ok(Json(user.into()))
}

pub async fn delete_user_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(user_id): Path<Uuid>,
) -> Result<Json<OperationResponse>, AppError> {
    require_admin(&claims)?;

    if claims.sub == user_id {
        return Err(AppError::BadRequest(
            "Nie możesz usunąć własnego konta".to_string(),
        ));
    }

    let has_orders: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(&app_state.db_pool)
            .await?;
    if has_orders {
        return Err(AppError::Conflict(
            "Nie można usunąć użytkownika posiadającego zamówienia".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&app_state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!("Usunięto użytkownika {}", user_id);
    Ok(Json(OperationResponse::ok("Użytkownik został usunięty")))
}
