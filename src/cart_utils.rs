// src/cart_utils.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{Cart, CartDetailsResponse, CartItem, CartItemPublic, CartItemWithProduct, Product,
        ProductStatus, Size},
    pricing::{self, CartPrices, PricingItem},
};

/// Krok wyszukiwania koszyka dla danego wywołania.
#[derive(Debug, PartialEq)]
pub enum CartLookup {
    ByUser(Uuid),
    BySession(Uuid),
}

/// Kolejność rozstrzygania właściciela koszyka. Zalogowany użytkownik
/// z identyfikatorem sesji dostaje OBA kroki: najpierw własny koszyk,
/// a w razie jego braku koszyk sesji (np. konto bez scalonego jeszcze
/// koszyka gościa). Każda operacja na koszyku, łącznie ze składaniem
/// zamówienia, przechodzi przez tę samą kolejność.
pub fn cart_lookup_order(
    user_id_opt: Option<Uuid>,
    session_cart_id_opt: Option<Uuid>,
) -> Vec<CartLookup> {
    let mut order = Vec::with_capacity(2);
    if let Some(user_id) = user_id_opt {
        order.push(CartLookup::ByUser(user_id));
    }
    if let Some(session_cart_id) = session_cart_id_opt {
        order.push(CartLookup::BySession(session_cart_id));
    }
    order
}

/// Znajduje aktywny koszyk zgodnie z `cart_lookup_order`.
pub async fn find_cart(
    conn: &mut PgConnection,
    user_id_opt: Option<Uuid>,
    session_cart_id_opt: Option<Uuid>,
) -> Result<Option<Cart>, AppError> {
    for lookup in cart_lookup_order(user_id_opt, session_cart_id_opt) {
        let cart = match lookup {
            CartLookup::ByUser(user_id) => {
                sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(&mut *conn)
                    .await?
            }
            CartLookup::BySession(session_cart_id) => {
                sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE session_cart_id = $1")
                    .bind(session_cart_id)
                    .fetch_optional(&mut *conn)
                    .await?
            }
        };
        if cart.is_some() {
            return Ok(cart);
        }
    }

    Ok(None)
}

/// Jak `find_cart`, ale blokuje znaleziony koszyk do końca transakcji.
/// Dla mutacji, które muszą widzieć spójny zbiór pozycji (np. checkout).
pub async fn find_cart_for_update(
    conn: &mut PgConnection,
    user_id_opt: Option<Uuid>,
    session_cart_id_opt: Option<Uuid>,
) -> Result<Option<Cart>, AppError> {
    let cart = match find_cart(&mut *conn, user_id_opt, session_cart_id_opt).await? {
        Some(cart) => cart,
        None => return Ok(None),
    };

    let locked = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = $1 FOR UPDATE")
        .bind(cart.id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(locked)
}

/// Pobiera pozycje koszyka złączone z aktualnymi danymi produktów.
/// To jedyne źródło cen przy przeliczaniu — nigdy migawka po stronie koszyka.
pub async fn fetch_cart_items_with_products(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> Result<Vec<CartItemWithProduct>, AppError> {
    let items = sqlx::query_as::<_, CartItemWithProduct>(
        r#"
            SELECT
                ci.id AS cart_item_id,
                ci.cart_id,
                ci.quantity,
                ci.color,
                ci.size,
                ci.added_at,
                p.id AS product_id,
                p.name,
                p.slug,
                p.images,
                p.price,
                p.discount_percent,
                p.stock,
                p.status
            FROM cart_items ci
            JOIN products p ON ci.product_id = p.id
            WHERE ci.cart_id = $1
            ORDER BY ci.added_at ASC
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Przelicza i utrwala cztery pola cenowe koszyka na podstawie PEŁNEGO
/// aktualnego zbioru pozycji. Wywoływane po każdej mutacji koszyka,
/// w ramach tej samej transakcji co mutacja.
pub async fn recalculate_cart_prices(
    conn: &mut PgConnection,
    cart_id: Uuid,
) -> Result<CartPrices, AppError> {
    let items = fetch_cart_items_with_products(&mut *conn, cart_id).await?;

    let pricing_items: Vec<PricingItem> = items
        .iter()
        .map(|item| PricingItem {
            unit_price: item.price,
            discount_percent: item.discount_percent,
            quantity: item.quantity,
        })
        .collect();

    let prices = pricing::calculate_cart_prices(&pricing_items);

    sqlx::query(
        r#"
            UPDATE carts
            SET items_price = $1,
                shipping_price = $2,
                tax_price = $3,
                total_price = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
        "#,
    )
    .bind(prices.items_price)
    .bind(prices.shipping_price)
    .bind(prices.tax_price)
    .bind(prices.total_price)
    .bind(cart_id)
    .execute(&mut *conn)
    .await?;

    Ok(prices)
}

/// Buduje pełną odpowiedź ze szczegółami koszyka. Ceny pozycji i sumy
/// liczone są na świeżo z danych produktów, nie z utrwalonych pól.
pub async fn build_cart_details_response(
    conn: &mut PgConnection,
    cart: &Cart,
) -> Result<CartDetailsResponse, AppError> {
    let items = fetch_cart_items_with_products(&mut *conn, cart.id).await?;

    let pricing_items: Vec<PricingItem> = items
        .iter()
        .map(|item| PricingItem {
            unit_price: item.price,
            discount_percent: item.discount_percent,
            quantity: item.quantity,
        })
        .collect();
    let prices = pricing::calculate_cart_prices(&pricing_items);

    let mut total_quantity: i64 = 0;
    let mut items_public: Vec<CartItemPublic> = Vec::with_capacity(items.len());

    for row in items {
        let discounted_price = pricing::discounted_unit_price(row.price, row.discount_percent);
        total_quantity += row.quantity as i64;
        items_public.push(CartItemPublic {
            cart_item_id: row.cart_item_id,
            product_id: row.product_id,
            name: row.name,
            slug: row.slug,
            image: row.images.first().cloned(),
            quantity: row.quantity,
            color: row.color,
            size: row.size,
            price: row.price,
            discount_percent: row.discount_percent,
            discounted_price,
            item_total: discounted_price * row.quantity as i64,
            stock: row.stock,
        });
    }

    Ok(CartDetailsResponse {
        cart_id: cart.id,
        user_id: cart.user_id,
        items: items_public,
        total_quantity,
        items_price: prices.items_price,
        shipping_price: prices.shipping_price,
        tax_price: prices.tax_price,
        total_price: prices.total_price,
        updated_at: cart.updated_at,
    })
}

/// Decyzja, co zrobić z żądaniem "dodaj do koszyka" wobec istniejących pozycji.
#[derive(Debug, PartialEq)]
pub enum CartAddition {
    /// Pozycja o tej samej krotce (produkt, kolor, rozmiar) już istnieje.
    Increment { item_id: Uuid, new_quantity: i32 },
    /// Brak pasującej pozycji, wstawiamy nowy wiersz.
    Insert { quantity: i32 },
}

/// Planuje dodanie produktu do koszyka. Czysta logika: dopasowanie po krotce
/// (produkt, kolor, rozmiar) oraz weryfikacja stanu magazynowego.
pub fn plan_cart_addition(
    existing_items: &[CartItem],
    product: &Product,
    color: &Option<String>,
    size: &Option<Size>,
    requested_quantity: Option<i32>,
) -> Result<CartAddition, AppError> {
    if product.status != ProductStatus::InStock {
        return Err(AppError::UnprocessableEntity(
            "Produkt jest obecnie niedostępny".to_string(),
        ));
    }

    let requested = match requested_quantity {
        Some(q) if q > 0 => q,
        _ => 1,
    };

    let existing = existing_items
        .iter()
        .find(|item| item.matches(product.id, color, size));

    let (item_id, new_quantity) = match existing {
        Some(item) => (Some(item.id), item.quantity + requested),
        None => (None, requested),
    };

    if new_quantity > product.stock {
        return Err(AppError::UnprocessableEntity(format!(
            "Dostępnych jest tylko {} sztuk produktu",
            product.stock
        )));
    }

    Ok(match item_id {
        Some(item_id) => CartAddition::Increment {
            item_id,
            new_quantity,
        },
        None => CartAddition::Insert {
            quantity: new_quantity,
        },
    })
}

/// Decyzja, co zrobić z żądaniem "usuń z koszyka" wobec istniejącej pozycji.
#[derive(Debug, PartialEq)]
pub enum CartRemoval {
    /// Ostatnia sztuka albo jawne usunięcie całej pozycji: wiersz znika.
    Delete { item_id: Uuid },
    /// Pozycja zostaje z ilością mniejszą o jeden.
    Decrement { item_id: Uuid, new_quantity: i32 },
}

/// Planuje usunięcie z koszyka: domyślnie zmniejszamy ilość o jeden,
/// wiersz jest kasowany przy ostatniej sztuce lub na wyraźne żądanie.
pub fn plan_cart_removal(item: &CartItem, remove_all: bool) -> CartRemoval {
    if remove_all || item.quantity <= 1 {
        CartRemoval::Delete { item_id: item.id }
    } else {
        CartRemoval::Decrement {
            item_id: item.id,
            new_quantity: item.quantity - 1,
        }
    }
}

/// Pojedynczy krok planu scalania koszyka sesji z koszykiem użytkownika.
#[derive(Debug, PartialEq)]
pub enum MergeAction {
    /// Krotka istnieje w obu koszykach: sumujemy ilości.
    Increment {
        target_item_id: Uuid,
        add_quantity: i32,
    },
    /// Krotka istnieje tylko w koszyku sesji: przenosimy wiersz.
    Move { session_item_id: Uuid },
}

/// Planuje scalenie: dla każdej pozycji koszyka sesji szuka dopasowania
/// po krotce (produkt, kolor, rozmiar) w koszyku użytkownika.
pub fn plan_cart_merge(session_items: &[CartItem], user_items: &[CartItem]) -> Vec<MergeAction> {
    session_items
        .iter()
        .map(|session_item| {
            match user_items.iter().find(|user_item| {
                user_item.matches(
                    session_item.product_id,
                    &session_item.color,
                    &session_item.size,
                )
            }) {
                Some(user_item) => MergeAction::Increment {
                    target_item_id: user_item.id,
                    add_quantity: session_item.quantity,
                },
                None => MergeAction::Move {
                    session_item_id: session_item.id,
                },
            }
        })
        .collect()
}

/// Scala koszyk sesji (sprzed zalogowania) z koszykiem użytkownika.
/// Całość wykonuje się w transakcji wołającego — częściowe scalenie
/// (część pozycji przeniesiona, koszyk sesji nieusunięty) nie może się utrwalić.
pub async fn merge_session_cart_into_user_cart(
    conn: &mut PgConnection,
    session_cart_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    let session_cart = match sqlx::query_as::<_, Cart>(
        "SELECT * FROM carts WHERE session_cart_id = $1 FOR UPDATE",
    )
    .bind(session_cart_id)
    .fetch_optional(&mut *conn)
    .await?
    {
        Some(cart) => cart,
        None => return Ok(()), // brak koszyka sesji, nic do scalenia
    };

    let session_items =
        sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE cart_id = $1 FOR UPDATE")
            .bind(session_cart.id)
            .fetch_all(&mut *conn)
            .await?;

    if session_items.is_empty() {
        return Ok(());
    }

    let user_cart_opt =
        sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    match user_cart_opt {
        None => {
            // Użytkownik nie ma koszyka: przejmujemy koszyk sesji jednym UPDATE,
            // żeby nie istniał stan przejściowy z oboma identyfikatorami naraz.
            sqlx::query(
                r#"
                    UPDATE carts
                    SET user_id = $1, session_cart_id = NULL, updated_at = CURRENT_TIMESTAMP
                    WHERE id = $2
                "#,
            )
            .bind(user_id)
            .bind(session_cart.id)
            .execute(&mut *conn)
            .await?;

            recalculate_cart_prices(&mut *conn, session_cart.id).await?;
            tracing::info!(
                "Koszyk sesji {} przepisany na użytkownika {}",
                session_cart.id,
                user_id
            );
        }
        Some(user_cart) => {
            let user_items = sqlx::query_as::<_, CartItem>(
                "SELECT * FROM cart_items WHERE cart_id = $1 FOR UPDATE",
            )
            .bind(user_cart.id)
            .fetch_all(&mut *conn)
            .await?;

            for action in plan_cart_merge(&session_items, &user_items) {
                match action {
                    MergeAction::Increment {
                        target_item_id,
                        add_quantity,
                    } => {
                        sqlx::query("UPDATE cart_items SET quantity = quantity + $1 WHERE id = $2")
                            .bind(add_quantity)
                            .bind(target_item_id)
                            .execute(&mut *conn)
                            .await?;
                    }
                    MergeAction::Move { session_item_id } => {
                        sqlx::query("UPDATE cart_items SET cart_id = $1 WHERE id = $2")
                            .bind(user_cart.id)
                            .bind(session_item_id)
                            .execute(&mut *conn)
                            .await?;
                    }
                }
            }

            // Zsumowane pozycje zostały w koszyku sesji — kaskada je usunie.
            sqlx::query("DELETE FROM carts WHERE id = $1")
                .bind(session_cart.id)
                .execute(&mut *conn)
                .await?;

            recalculate_cart_prices(&mut *conn, user_cart.id).await?;
            tracing::info!(
                "Scalono koszyk sesji {} z koszykiem {} użytkownika {}",
                session_cart.id,
                user_cart.id,
                user_id
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetAudience;
    use chrono::Utc;

    fn test_product(stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Koszulka basic".to_string(),
            slug: "koszulka-basic".to_string(),
            description: "Bawełniana koszulka".to_string(),
            images: vec!["/images/koszulka.jpg".to_string()],
            category: vec!["koszulki".to_string()],
            target_audience: TargetAudience::Unisex,
            price: 40_00,
            discount_percent: None,
            stock,
            status: ProductStatus::InStock,
            rating: 0.0,
            num_reviews: 0,
            color: None,
            material: None,
            size: vec![Size::S, Size::M, Size::L],
            is_new: false,
            best_seller: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_item(
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        color: Option<&str>,
        size: Option<Size>,
    ) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            cart_id,
            product_id,
            quantity,
            color: color.map(str::to_string),
            size,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn adding_same_tuple_increments_instead_of_inserting() {
        let product = test_product(10);
        let cart_id = Uuid::new_v4();
        let existing = vec![test_item(cart_id, product.id, 2, None, Some(Size::M))];

        let plan =
            plan_cart_addition(&existing, &product, &None, &Some(Size::M), Some(3)).unwrap();

        assert_eq!(
            plan,
            CartAddition::Increment {
                item_id: existing[0].id,
                new_quantity: 5
            }
        );
    }

    #[test]
    fn different_size_is_a_new_row() {
        let product = test_product(10);
        let cart_id = Uuid::new_v4();
        let existing = vec![test_item(cart_id, product.id, 2, None, Some(Size::M))];

        let plan =
            plan_cart_addition(&existing, &product, &None, &Some(Size::L), Some(1)).unwrap();

        assert_eq!(plan, CartAddition::Insert { quantity: 1 });
    }

    #[test]
    fn addition_exceeding_stock_is_rejected() {
        let product = test_product(4);
        let cart_id = Uuid::new_v4();
        let existing = vec![test_item(cart_id, product.id, 3, None, Some(Size::M))];

        // 3 w koszyku + 2 żądane > 4 na stanie
        let result = plan_cart_addition(&existing, &product, &None, &Some(Size::M), Some(2));
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));

        // nowy wiersz powyżej stanu też odpada
        let result = plan_cart_addition(&[], &product, &None, &Some(Size::S), Some(5));
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }

    #[test]
    fn addition_defaults_quantity_to_one() {
        let product = test_product(1);

        let plan = plan_cart_addition(&[], &product, &None, &None, None).unwrap();
        assert_eq!(plan, CartAddition::Insert { quantity: 1 });

        let plan = plan_cart_addition(&[], &product, &None, &None, Some(0)).unwrap();
        assert_eq!(plan, CartAddition::Insert { quantity: 1 });
    }

    #[test]
    fn unavailable_product_cannot_be_added() {
        let mut product = test_product(10);
        product.status = ProductStatus::Discontinued;

        let result = plan_cart_addition(&[], &product, &None, &None, Some(1));
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }

    #[test]
    fn authenticated_caller_falls_back_to_session_cart() {
        let user_id = Uuid::new_v4();
        let session_cart_id = Uuid::new_v4();

        // zalogowany klient z koszykiem sesji: najpierw własny koszyk,
        // przy jego braku koszyk sesji
        assert_eq!(
            cart_lookup_order(Some(user_id), Some(session_cart_id)),
            vec![
                CartLookup::ByUser(user_id),
                CartLookup::BySession(session_cart_id)
            ]
        );

        assert_eq!(
            cart_lookup_order(None, Some(session_cart_id)),
            vec![CartLookup::BySession(session_cart_id)]
        );
        assert_eq!(cart_lookup_order(None, None), vec![]);
    }

    #[test]
    fn removing_last_unit_deletes_the_row() {
        let item = test_item(Uuid::new_v4(), Uuid::new_v4(), 1, None, Some(Size::M));

        let plan = plan_cart_removal(&item, false);
        assert_eq!(plan, CartRemoval::Delete { item_id: item.id });
    }

    #[test]
    fn removal_above_one_unit_decrements() {
        let item = test_item(Uuid::new_v4(), Uuid::new_v4(), 3, Some("czarny"), None);

        let plan = plan_cart_removal(&item, false);
        assert_eq!(
            plan,
            CartRemoval::Decrement {
                item_id: item.id,
                new_quantity: 2
            }
        );
    }

    #[test]
    fn remove_all_deletes_regardless_of_quantity() {
        let item = test_item(Uuid::new_v4(), Uuid::new_v4(), 5, None, None);

        let plan = plan_cart_removal(&item, true);
        assert_eq!(plan, CartRemoval::Delete { item_id: item.id });
    }

    #[test]
    fn merge_sums_quantities_for_shared_tuples_and_moves_the_rest() {
        let session_cart = Uuid::new_v4();
        let user_cart = Uuid::new_v4();
        let shared_product = Uuid::new_v4();
        let session_only_product = Uuid::new_v4();

        let session_items = vec![
            test_item(session_cart, shared_product, 2, Some("czarny"), Some(Size::M)),
            test_item(session_cart, session_only_product, 1, None, None),
        ];
        let user_items = vec![
            test_item(user_cart, shared_product, 3, Some("czarny"), Some(Size::M)),
            test_item(user_cart, shared_product, 1, Some("biały"), Some(Size::M)),
        ];

        let plan = plan_cart_merge(&session_items, &user_items);

        // wynik: 3 różne krotki, wspólna z ilością 5
        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan[0],
            MergeAction::Increment {
                target_item_id: user_items[0].id,
                add_quantity: 2
            }
        );
        assert_eq!(
            plan[1],
            MergeAction::Move {
                session_item_id: session_items[1].id
            }
        );
    }

    #[test]
    fn merge_matches_tuple_exactly_not_just_product() {
        let session_cart = Uuid::new_v4();
        let user_cart = Uuid::new_v4();
        let product = Uuid::new_v4();

        // ten sam produkt, inny kolor -> osobna pozycja, nie sumowanie
        let session_items = vec![test_item(session_cart, product, 1, Some("czerwony"), None)];
        let user_items = vec![test_item(user_cart, product, 1, Some("zielony"), None)];

        let plan = plan_cart_merge(&session_items, &user_items);
        assert_eq!(
            plan,
            vec![MergeAction::Move {
                session_item_id: session_items[0].id
            }]
        );
    }
}
