// src/email_service.rs

use resend_rs::{Resend, types::CreateEmailBaseOptions};

use crate::{
    errors::AppError,
    models::OrderDetailsResponse,
    pricing::format_price,
    state::AppState,
};

const SENDER_DISPLAY_NAME: &str = "Urban Edge";

fn format_price_pln(amount: i64) -> String {
    format!("{} zł", format_price(amount).replace('.', ","))
}

/// Wysyła e-mail z potwierdzeniem opłacenia zamówienia.
/// Wołane po zatwierdzeniu transakcji, niepowodzenie wysyłki nie cofa płatności.
pub async fn send_purchase_receipt(
    app_state: &AppState,
    order_details: &OrderDetailsResponse,
) -> Result<(), AppError> {
    let recipient_email = match &order_details.user_email {
        Some(email) => email.clone(),
        None => {
            tracing::error!(
                "Nie można ustalić adresu e-mail odbiorcy dla zamówienia {}",
                order_details.order.id
            );
            return Err(AppError::InternalServerError(
                "Brak adresu e-mail do wysyłki potwierdzenia".to_string(),
            ));
        }
    };

    let resend = Resend::new(&app_state.resend_api_key);

    let sender_formatted = format!("{} <{}>", SENDER_DISPLAY_NAME, app_state.admin_email);
    let subject = format!(
        "Potwierdzenie płatności za zamówienie #{}",
        &order_details.order.id.to_string()[..8]
    );
    let email_html_content = render_purchase_receipt_html(order_details);

    let params = CreateEmailBaseOptions::new(
        &sender_formatted,
        vec![recipient_email.clone()],
        &subject,
    )
    .with_html(&email_html_content);

    tracing::info!(
        "Wysyłanie potwierdzenia płatności zamówienia {} do: {}",
        order_details.order.id,
        recipient_email
    );

    resend.emails.send(params).await.map_err(|e| {
        tracing::error!("Błąd API Resend: {:?}", e);
        AppError::InternalServerError("Błąd podczas wysyłania e-maila".to_string())
    })?;

    Ok(())
}

fn render_purchase_receipt_html(order_details: &OrderDetailsResponse) -> String {
    let order = &order_details.order;
    let order_id_short = &order.id.to_string()[..8];

    let mut items_html = String::new();
    for item in &order_details.items {
        items_html.push_str(&format!(
            r#"<div class="item">
                <img src="{image}" alt="{name}">
                <div class="item-details">
                    <strong>{name}</strong><br>
                    <span>Ilość: {quantity} | Cena: {price}</span>
                </div>
            </div>"#,
            image = item.image,
            name = item.name,
            quantity = item.quantity,
            price = format_price_pln(item.price),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="pl">
<head>
    <meta charset="UTF-8">
    <title>Potwierdzenie płatności</title>
    <style>
        body {{ font-family: Arial, sans-serif; color: #333; }}
        .container {{ max-width: 600px; margin: auto; padding: 20px; border: 1px solid #ddd; }}
        .header {{ background-color: #212121; color: #fff; padding: 10px; text-align: center; }}
        .item {{ border-bottom: 1px solid #eee; padding: 10px 0; display: flex; }}
        .item img {{ width: 80px; height: 80px; object-fit: cover; margin-right: 15px; }}
        .item-details {{ flex-grow: 1; }}
        .summary {{ margin-top: 20px; }}
        .summary td {{ padding: 4px 0; }}
        .total {{ font-weight: bold; font-size: 1.2em; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{app_name}</h1>
            <h2>Dziękujemy za Twoje zamówienie!</h2>
        </div>
        <h3>Hej, {full_name}!</h3>
        <p>Otrzymaliśmy płatność za zamówienie nr #{order_id_short}. Poniżej znajdziesz jego podsumowanie.</p>

        {items_html}

        <table class="summary">
            <tr><td>Wartość produktów:</td><td>{items_price}</td></tr>
            <tr><td>Dostawa:</td><td>{shipping_price}</td></tr>
            <tr><td>Podatek:</td><td>{tax_price}</td></tr>
            <tr class="total"><td>Razem:</td><td>{total_price}</td></tr>
        </table>

        <h4>Adres dostawy</h4>
        <p>
            {full_name}<br>
            {street}<br>
            {postal_code} {city}<br>
            {country}
        </p>

        <p>Zespół {app_name}</p>
    </div>
</body>
</html>"#,
        app_name = SENDER_DISPLAY_NAME,
        full_name = order.shipping_full_name,
        order_id_short = order_id_short,
        items_html = items_html,
        items_price = format_price_pln(order.items_price),
        shipping_price = format_price_pln(order.shipping_price),
        tax_price = format_price_pln(order.tax_price),
        total_price = format_price_pln(order.total_price),
        street = order.shipping_street_address,
        postal_code = order.shipping_postal_code,
        city = order.shipping_city,
        country = order.shipping_country,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_formats_with_comma_and_currency() {
        assert_eq!(format_price_pln(11350), "113,50 zł");
        assert_eq!(format_price_pln(5), "0,05 zł");
    }
}
