// src/pricing.rs
//
// Kalkulator cen koszyka. Wszystkie kwoty w groszach (i64), dzięki czemu
// "zaokrąglenie do 2 miejsc" sprowadza się do zaokrąglenia do pełnych groszy
// (połówki w górę). Funkcje są czyste: dane wejściowe pochodzą zawsze
// z aktualnych wierszy products, nigdy od klienta.

/// Próg darmowej dostawy: powyżej 100.00 dostawa jest darmowa.
pub const FREE_SHIPPING_THRESHOLD: i64 = 100_00;
/// Stała opłata za dostawę poniżej progu.
pub const FLAT_SHIPPING_PRICE: i64 = 10_00;
/// Stawka podatku w procentach.
pub const TAX_RATE_PERCENT: i64 = 15;

/// Dane jednej pozycji potrzebne do wyceny.
#[derive(Debug, Clone, Copy)]
pub struct PricingItem {
    pub unit_price: i64,
    pub discount_percent: Option<i32>,
    pub quantity: i32,
}

/// Cztery wyliczone pola cenowe koszyka/zamówienia.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartPrices {
    pub items_price: i64,
    pub shipping_price: i64,
    pub tax_price: i64,
    pub total_price: i64,
}

/// Dzielenie z zaokrągleniem połówek w górę. Ceny są nieujemne,
/// wartości ujemne to błąd wołającego.
fn div_round_half_up(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator / 2) / denominator
}

/// Efektywna cena jednostkowa: cena po rabacie, gdy rabat jest obecny i > 0,
/// w przeciwnym razie cena regularna.
pub fn discounted_unit_price(unit_price: i64, discount_percent: Option<i32>) -> i64 {
    match discount_percent {
        Some(percent) if percent > 0 => {
            let discount = div_round_half_up(unit_price * percent as i64, 100);
            unit_price - discount
        }
        _ => unit_price,
    }
}

/// Wylicza cztery pola cenowe z listy pozycji.
///
/// - items_price = suma (cena efektywna * ilość); ilość <= 0 traktowana jako 1
/// - shipping_price = 0 powyżej progu darmowej dostawy, inaczej stała opłata
///   (pusty koszyk wciąż płaci stałą opłatę)
/// - tax_price = 15% items_price, zaokrąglone do grosza
/// - total_price = suma powyższych
pub fn calculate_cart_prices(items: &[PricingItem]) -> CartPrices {
    let items_price: i64 = items
        .iter()
        .map(|item| {
            let quantity = if item.quantity > 0 {
                item.quantity as i64
            } else {
                1
            };
            discounted_unit_price(item.unit_price, item.discount_percent) * quantity
        })
        .sum();

    let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
        0
    } else {
        FLAT_SHIPPING_PRICE
    };
    let tax_price = div_round_half_up(items_price * TAX_RATE_PERCENT, 100);
    let total_price = items_price + tax_price + shipping_price;

    CartPrices {
        items_price,
        shipping_price,
        tax_price,
        total_price,
    }
}

/// Formatuje kwotę w groszach do postaci dziesiętnej (np. 11350 -> "113.50").
pub fn format_price(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(unit_price: i64, quantity: i32) -> PricingItem {
        PricingItem {
            unit_price,
            discount_percent: None,
            quantity,
        }
    }

    #[test]
    fn calculates_example_order_totals() {
        // [{40.00 x2}, {10.00 x1}] -> items 90.00, dostawa 10.00, podatek 13.50, razem 113.50
        let prices = calculate_cart_prices(&[item(40_00, 2), item(10_00, 1)]);

        assert_eq!(prices.items_price, 90_00);
        assert_eq!(prices.shipping_price, 10_00);
        assert_eq!(prices.tax_price, 13_50);
        assert_eq!(prices.total_price, 113_50);
    }

    #[test]
    fn empty_cart_still_pays_flat_shipping() {
        let prices = calculate_cart_prices(&[]);

        assert_eq!(
            prices,
            CartPrices {
                items_price: 0,
                shipping_price: FLAT_SHIPPING_PRICE,
                tax_price: 0,
                total_price: FLAT_SHIPPING_PRICE,
            }
        );
    }

    #[test]
    fn free_shipping_boundary_is_exclusive() {
        // dokładnie 100.00 -> wciąż płatna dostawa
        let at_threshold = calculate_cart_prices(&[item(100_00, 1)]);
        assert_eq!(at_threshold.shipping_price, FLAT_SHIPPING_PRICE);

        // 100.01 -> darmowa
        let above_threshold = calculate_cart_prices(&[item(100_01, 1)]);
        assert_eq!(above_threshold.shipping_price, 0);
    }

    #[test]
    fn tax_is_fifteen_percent_rounded_half_up() {
        // 0.01 -> podatek 0.0015 -> 0.00
        assert_eq!(calculate_cart_prices(&[item(1, 1)]).tax_price, 0);
        // 0.10 -> podatek 0.015 -> 0.02 (połówka w górę)
        assert_eq!(calculate_cart_prices(&[item(10, 1)]).tax_price, 2);
        // 90.00 -> 13.50
        assert_eq!(calculate_cart_prices(&[item(90_00, 1)]).tax_price, 13_50);
    }

    #[test]
    fn items_price_is_order_invariant() {
        let a = item(19_99, 3);
        let b = PricingItem {
            unit_price: 45_50,
            discount_percent: Some(20),
            quantity: 2,
        };
        let c = item(5_00, 1);

        let forward = calculate_cart_prices(&[a, b, c]);
        let backward = calculate_cart_prices(&[c, b, a]);

        assert_eq!(forward, backward);
    }

    #[test]
    fn quantity_zero_defaults_to_one() {
        let prices = calculate_cart_prices(&[item(25_00, 0)]);
        assert_eq!(prices.items_price, 25_00);
    }

    #[test]
    fn discount_applies_per_unit_with_cent_rounding() {
        // 33.33 z rabatem 10%: rabat 3.333 -> 3.33, cena 30.00
        assert_eq!(discounted_unit_price(33_33, Some(10)), 30_00);
        // rabat 0 lub brak -> cena regularna
        assert_eq!(discounted_unit_price(33_33, Some(0)), 33_33);
        assert_eq!(discounted_unit_price(33_33, None), 33_33);
        // rabat 100% -> 0
        assert_eq!(discounted_unit_price(33_33, Some(100)), 0);
    }

    #[test]
    fn discounted_items_sum_into_items_price() {
        // 50.00 z rabatem 50% x2 = 50.00; 25.00 bez rabatu x1
        let prices = calculate_cart_prices(&[
            PricingItem {
                unit_price: 50_00,
                discount_percent: Some(50),
                quantity: 2,
            },
            item(25_00, 1),
        ]);

        assert_eq!(prices.items_price, 75_00);
        assert_eq!(prices.shipping_price, 10_00);
    }

    #[test]
    fn formats_minor_units() {
        assert_eq!(format_price(11350), "113.50");
        assert_eq!(format_price(5), "0.05");
        assert_eq!(format_price(100_00), "100.00");
    }
}
