// src/filters.rs
use crate::models::{ProductStatus, TargetAudience};
use serde::Deserialize;

const DEFAULT_PAGE_LIMIT: i64 = 12;
const MAX_PAGE_LIMIT: i64 = 50;
const DEFAULT_SORT_BY: &str = "created_at";
const DEFAULT_SORT_ORDER: &str = "desc";

/// Parametry zapytania dla listy produktów.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListingParams {
    // Paginacja
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,

    // Filtry
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    target_audience: Option<TargetAudience>,
    #[serde(default)]
    status: Option<ProductStatus>,
    #[serde(default)]
    price_min: Option<i64>,
    #[serde(default)]
    price_max: Option<i64>,
    #[serde(default)]
    rating_min: Option<f64>,

    // Sortowanie
    #[serde(default)]
    sort_by: Option<String>,
    #[serde(default)]
    order: Option<String>,
}

impl ListingParams {
    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 && limit <= MAX_PAGE_LIMIT => limit,
            Some(_) => MAX_PAGE_LIMIT,
            None => DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Fraza wyszukiwania; puste lub białe znaki traktujemy jak brak filtra.
    pub fn q(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn target_audience(&self) -> Option<TargetAudience> {
        self.target_audience
    }

    pub fn status(&self) -> Option<ProductStatus> {
        self.status
    }

    pub fn price_min(&self) -> Option<i64> {
        self.price_min
    }

    pub fn price_max(&self) -> Option<i64> {
        self.price_max
    }

    pub fn rating_min(&self) -> Option<f64> {
        self.rating_min
    }

    /// Kolumna sortowania z białej listy. Nazwy spoza listy wracają do domyślnej,
    /// bo kolumna trafia bezpośrednio do SQL.
    pub fn sort_by(&self) -> &str {
        match self.sort_by.as_deref() {
            Some(column @ ("name" | "price" | "rating" | "created_at")) => column,
            _ => DEFAULT_SORT_BY,
        }
    }

    pub fn order(&self) -> &str {
        self.order.as_deref().map_or(DEFAULT_SORT_ORDER, |o| {
            if o.eq_ignore_ascii_case("asc") {
                "asc"
            } else {
                "desc"
            }
        })
    }
}

/// Parametry dla list w panelu admina (zamówienia, użytkownicy, recenzje).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdminListingParams {
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
    #[serde(default)]
    q: Option<String>,
}

impl AdminListingParams {
    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 && limit <= MAX_PAGE_LIMIT => limit,
            Some(_) => MAX_PAGE_LIMIT,
            None => DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn q(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_from_query(query: &str) -> ListingParams {
        serde_urlencoded::from_str(query).unwrap()
    }

    #[test]
    fn limit_is_clamped_to_max() {
        let params = params_from_query("limit=500");
        assert_eq!(params.limit(), MAX_PAGE_LIMIT);

        let params = params_from_query("limit=-3");
        assert_eq!(params.limit(), MAX_PAGE_LIMIT);

        let params = params_from_query("");
        assert_eq!(params.limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn sort_column_outside_whitelist_falls_back() {
        let params = params_from_query("sort-by=password_hash");
        assert_eq!(params.sort_by(), DEFAULT_SORT_BY);

        let params = params_from_query("sort-by=price&order=asc");
        assert_eq!(params.sort_by(), "price");
        assert_eq!(params.order(), "asc");
    }

    #[test]
    fn blank_search_phrase_is_no_filter() {
        let params = params_from_query("q=%20%20");
        assert_eq!(params.q(), None);

        let params = params_from_query("q=kurtka");
        assert_eq!(params.q(), Some("kurtka"));
    }
}
