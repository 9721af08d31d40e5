// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::Type;
use sqlx::types::Json;
use strum_macros::{Display, EnumIter, EnumString};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Type, EnumString, Display)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Admin,
    Customer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Type, EnumString, Display)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum PaymentMethod {
    Stripe,
    Paypal,
    CashOnDelivery,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Type, EnumString, Display, EnumIter,
)]
#[sqlx(type_name = "target_audience", rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum TargetAudience {
    Men,
    Women,
    Kids,
    Unisex,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Type, EnumString, Display)]
#[sqlx(type_name = "product_status", rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ProductStatus {
    InStock,
    OutOfStock,
    Discontinued,
}

/// Rozmiar to zamknięta lista wartości, nie dowolny tekst.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Type,
    EnumString,
    Display,
    EnumIter,
)]
#[sqlx(type_name = "product_size", rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Size {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Type, EnumString, Display)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum OrderStatus {
    Pending,    // Oczekujące na płatność
    Processing, // Opłacone, w trakcie realizacji
    Delivered,  // Dostarczone
    Cancelled,  // Anulowane
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub images: Vec<String>,
    pub category: Vec<String>,
    pub target_audience: TargetAudience,
    pub price: i64,
    pub discount_percent: Option<i32>,
    pub stock: i32,
    pub status: ProductStatus,
    pub rating: f64,
    pub num_reviews: i32,
    pub color: Option<String>,
    pub material: Option<String>,
    pub size: Vec<Size>,
    pub is_new: bool,
    pub best_seller: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub address_full_name: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_postal_code: Option<String>,
    pub address_country: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Zwraca zapisany adres wysyłki, jeśli użytkownik uzupełnił wszystkie pola.
    pub fn shipping_address(&self) -> Option<ShippingAddress> {
        Some(ShippingAddress {
            full_name: self.address_full_name.clone()?,
            street_address: self.address_street.clone()?,
            city: self.address_city.clone()?,
            postal_code: self.address_postal_code.clone()?,
            country: self.address_country.clone()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        let address = user.shipping_address();
        UserPublic {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            address,
            payment_method: user.payment_method,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Adres wysyłki: kopiowany do zamówienia, nigdy nie referencjonowany.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 3, max = 255, message = "Imię i nazwisko jest wymagane"))]
    pub full_name: String,

    #[validate(length(min = 3, max = 255, message = "Ulica jest wymagana"))]
    pub street_address: String,

    #[validate(length(min = 3, max = 100, message = "Miasto jest wymagane"))]
    pub city: String,

    #[validate(length(min = 3, max = 20, message = "Kod pocztowy jest wymagany"))]
    pub postal_code: String,

    #[validate(length(min = 3, max = 100, message = "Kraj jest wymagany"))]
    pub country: String,
}

// --- STRUKTURY DLA KOSZYKA ZAKUPÓW ---

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub session_cart_id: Option<Uuid>,
    pub items_price: i64,
    pub shipping_price: i64,
    pub tax_price: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub color: Option<String>,
    pub size: Option<Size>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Sprawdza, czy pozycja odpowiada krotce (produkt, kolor, rozmiar).
    pub fn matches(&self, product_id: Uuid, color: &Option<String>, size: &Option<Size>) -> bool {
        self.product_id == product_id && self.color == *color && self.size == *size
    }
}

/// Pozycja koszyka złączona z aktualnymi danymi produktu.
/// Cena i stan magazynowy pochodzą zawsze z tabeli products, nigdy z koszyka.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemWithProduct {
    pub cart_item_id: Uuid, // ci.id AS cart_item_id
    pub cart_id: Uuid,      // ci.cart_id
    pub quantity: i32,      // ci.quantity
    pub color: Option<String>,
    pub size: Option<Size>,
    pub added_at: DateTime<Utc>,

    pub product_id: Uuid, // p.id AS product_id
    pub name: String,     // p.name
    pub slug: String,     // p.slug
    pub images: Vec<String>,
    pub price: i64, // p.price (aktualna cena, nie migawka)
    pub discount_percent: Option<i32>,
    pub stock: i32,
    pub status: ProductStatus,
}

// --- STRUKTURY PAYLOAD DLA HANDLERÓW KOSZYKA ---

#[derive(Debug, Clone, Deserialize)]
pub struct AddItemToCartPayload {
    pub product_id: Uuid,
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub size: Option<Size>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemParams {
    pub color: Option<String>,
    pub size: Option<Size>,
    #[serde(default)]
    pub remove_all: bool,
}

///Payload dla scalania koszyka po zalogowaniu
#[derive(Debug, Deserialize)]
pub struct MergeCartPayload {
    pub session_cart_id: Uuid,
}

// --- STRUKTURY ODPOWIEDZI API DLA KOSZYKA ---

#[derive(Debug, Serialize, Clone)]
pub struct CartItemPublic {
    pub cart_item_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub color: Option<String>,
    pub size: Option<Size>,
    pub price: i64,
    pub discount_percent: Option<i32>,
    pub discounted_price: i64,
    pub item_total: i64,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
pub struct CartDetailsResponse {
    pub cart_id: Uuid,
    pub user_id: Option<Uuid>,
    pub items: Vec<CartItemPublic>,
    pub total_quantity: i64,
    pub items_price: i64,
    pub shipping_price: i64,
    pub tax_price: i64,
    pub total_price: i64,
    pub updated_at: DateTime<Utc>,
}

// --- STRUKTURY DLA ZAMÓWIEŃ ---

/// Wynik płatności przekazywany przez webhook dostawcy płatności.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub email: String,
    pub amount_paid: i64,
}

/// Reprezentuje zamówienie. Migawka cen i adresu jest niezmienna po utworzeniu.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_full_name: String,
    pub shipping_street_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub payment_method: PaymentMethod,
    pub items_price: i64,
    pub shipping_price: i64,
    pub tax_price: i64,
    pub total_price: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub payment_result: Option<Json<PaymentResult>>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pojedyncza pozycja zamówienia: pełna zdenormalizowana migawka produktu.
/// Rozmiar to jedna wartość, bo pozycja opisuje dokładnie jedną kupioną konfigurację.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub color: Option<String>,
    pub size: Option<Size>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailsResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Wiersz zamówienia z danymi klienta, dla list w panelu admina.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderWithCustomerInfo {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: Order,
    pub user_name: String,
    pub user_email: String,
}

// --- STRUKTURY DLA RECENZJI ---

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub description: String,
    pub is_verified_purchase: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub review: Review,
    pub user_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertReviewPayload {
    #[validate(range(min = 1, max = 5, message = "Ocena musi być w zakresie 1-5"))]
    pub rating: i32,

    #[validate(length(min = 3, max = 255, message = "Tytuł musi mieć co najmniej 3 znaki"))]
    pub title: String,

    #[validate(length(min = 3, message = "Opis musi mieć co najmniej 3 znaki"))]
    pub description: String,
}

// --- STRUKTURY PAYLOAD DLA PRODUKTÓW (PANEL ADMINA) ---

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductPayload {
    #[validate(length(min = 3, max = 255, message = "Nazwa musi mieć co najmniej 3 znaki"))]
    pub name: String,

    #[validate(length(min = 3, max = 255, message = "Slug musi mieć co najmniej 3 znaki"))]
    pub slug: String,

    #[validate(length(min = 3, message = "Opis musi mieć co najmniej 3 znaki"))]
    pub description: String,

    #[validate(length(min = 1, message = "Produkt musi mieć co najmniej jedno zdjęcie"))]
    pub images: Vec<String>,

    pub category: Vec<String>,
    pub target_audience: TargetAudience,

    #[validate(range(min = 0, message = "Cena nie może być ujemna"))]
    pub price: i64,

    #[validate(range(min = 0, max = 100, message = "Rabat musi być w zakresie 0-100"))]
    pub discount_percent: Option<i32>,

    #[validate(range(min = 0, message = "Stan magazynowy nie może być ujemny"))]
    pub stock: i32,

    pub status: Option<ProductStatus>,
    pub color: Option<String>,
    pub material: Option<String>,
    #[serde(default)]
    pub size: Vec<Size>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub best_seller: bool,
}

/// Rozróżnia jawne `null` od braku pola przy częściowej aktualizacji:
/// brak pola -> `None` (bez zmian), `null` -> `Some(None)` (wyczyść).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Częściowa aktualizacja produktu: tylko przekazane pola są zmieniane.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProductPayload {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<Vec<String>>,
    pub target_audience: Option<TargetAudience>,
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub discount_percent: Option<Option<i32>>,
    pub stock: Option<i32>,
    pub status: Option<ProductStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub material: Option<Option<String>>,
    pub size: Option<Vec<Size>>,
    pub is_new: Option<bool>,
    pub best_seller: Option<bool>,
}

// --- STRUKTURY PAYLOAD DLA KONTA UŻYTKOWNIKA ---

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 3, max = 255, message = "Imię musi mieć co najmniej 3 znaki"))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentMethodPayload {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserPayload {
    #[validate(length(min = 3, max = 255, message = "Imię musi mieć co najmniej 3 znaki"))]
    pub name: String,
    pub role: Role,
}

// --- UNIWERSALNA ODPOWIEDŹ OPERACJI ---

/// Jednolity wynik mutacji: sukces/komunikat oraz opcjonalne przekierowanie,
/// którym ma się zająć warstwa nawigacji klienta (np. brak adresu -> formularz adresu).
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl OperationResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        OperationResponse {
            success: true,
            message: message.into(),
            redirect_to: None,
        }
    }

    pub fn ok_with_redirect(message: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        OperationResponse {
            success: true,
            message: message.into(),
            redirect_to: Some(redirect_to.into()),
        }
    }

    pub fn fail_with_redirect(message: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        OperationResponse {
            success: false,
            message: message.into(),
            redirect_to: Some(redirect_to.into()),
        }
    }
}

/// Kategoria z liczbą produktów, dla nawigacji katalogu.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

// --- PANEL ADMINA: PODSUMOWANIE SPRZEDAŻY ---

#[derive(Debug, Serialize)]
pub struct MonthlySales {
    pub month: String,
    pub total_sales: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderSummaryResponse {
    pub orders_count: i64,
    pub products_count: i64,
    pub users_count: i64,
    pub total_sales: i64,
    pub sales_data: Vec<MonthlySales>,
    pub latest_sales: Vec<OrderWithCustomerInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn size_parses_case_insensitively() {
        assert_eq!(Size::from_str("xl").unwrap(), Size::Xl);
        assert_eq!(Size::from_str("XL").unwrap(), Size::Xl);
        assert!(Size::from_str("gigantic").is_err());
    }

    #[test]
    fn cart_item_matches_on_full_tuple() {
        let product_id = Uuid::new_v4();
        let item = CartItem {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id,
            quantity: 2,
            color: Some("czarny".to_string()),
            size: Some(Size::M),
            added_at: Utc::now(),
        };

        assert!(item.matches(product_id, &Some("czarny".to_string()), &Some(Size::M)));
        // inny rozmiar tego samego produktu to osobna pozycja
        assert!(!item.matches(product_id, &Some("czarny".to_string()), &Some(Size::L)));
        assert!(!item.matches(product_id, &None, &Some(Size::M)));
        assert!(!item.matches(Uuid::new_v4(), &Some("czarny".to_string()), &Some(Size::M)));
    }

    #[test]
    fn shipping_address_requires_all_fields() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Jan Kowalski".to_string(),
            email: "jan@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Customer,
            address_full_name: Some("Jan Kowalski".to_string()),
            address_street: Some("Prosta 1".to_string()),
            address_city: Some("Warszawa".to_string()),
            address_postal_code: None,
            address_country: Some("Polska".to_string()),
            payment_method: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(user.shipping_address().is_none());
    }

    #[test]
    fn partial_update_distinguishes_null_from_absent_field() {
        // brak pola -> bez zmian
        let payload: UpdateProductPayload = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(payload.discount_percent, None);
        assert_eq!(payload.color, None);

        // jawne null -> wyczyść kolumnę
        let payload: UpdateProductPayload =
            serde_json::from_str(r#"{"discount_percent": null, "color": null}"#).unwrap();
        assert_eq!(payload.discount_percent, Some(None));
        assert_eq!(payload.color, Some(None));

        // wartość -> ustaw
        let payload: UpdateProductPayload =
            serde_json::from_str(r#"{"discount_percent": 25}"#).unwrap();
        assert_eq!(payload.discount_percent, Some(Some(25)));
    }

    #[test]
    fn review_payload_rejects_rating_out_of_range() {
        let payload = UpsertReviewPayload {
            rating: 6,
            title: "Świetny produkt".to_string(),
            description: "Bardzo dobra jakość.".to_string(),
        };
        assert!(payload.validate().is_err());

        let payload = UpsertReviewPayload {
            rating: 5,
            ..payload
        };
        assert!(payload.validate().is_ok());
    }
}
