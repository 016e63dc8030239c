//! Product catalog: backend product records, search, and pagination.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use suturahub_core::{Price, ProductId};

use crate::models::cart::{ProductInput, lenient_decimal};

/// Products shown per catalog page.
pub const PRODUCTS_PER_PAGE: usize = 20;

/// A product as listed by `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    /// Older listings carry `name` instead of `title`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    pub price: Price,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub discount_percent: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub discount_price: Option<Decimal>,
    /// Image path relative to the API origin, or an absolute URL.
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub sizes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub colors: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<String>,
}

impl CatalogProduct {
    /// `title`, falling back to `name`.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            self.name.as_deref().unwrap_or_default()
        } else {
            &self.title
        }
    }

    /// Whether the advertised discount is usable: a positive percentage and
    /// a discount price below the list price.
    #[must_use]
    pub fn has_valid_discount(&self) -> bool {
        match (self.discount_percent, self.discount_price) {
            (Some(percent), Some(price)) => {
                percent > Decimal::ZERO && price >= Decimal::ZERO && price < self.price.amount()
            }
            _ => false,
        }
    }

    /// The price a buyer pays.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        if self.has_valid_discount() {
            self.discount_price
                .and_then(|p| Price::new(p).ok())
                .unwrap_or(self.price)
        } else {
            self.price
        }
    }

    /// Absolute URL of the primary image.
    ///
    /// Relative paths are resolved under `api_base`.
    #[must_use]
    pub fn picture_url(&self, api_base: &Url) -> Option<String> {
        let image = self.primary_image.as_deref().map(str::trim)?;
        if image.is_empty() {
            return None;
        }
        if Url::parse(image).is_ok() {
            return Some(image.to_owned());
        }
        api_base
            .join(image.trim_start_matches('/'))
            .ok()
            .map(String::from)
    }

    /// Add-to-cart payload for this product.
    #[must_use]
    pub fn to_cart_input(&self, api_base: &Url) -> ProductInput {
        let title = self.display_title().to_owned();
        ProductInput {
            id: Some(self.id.to_string()),
            name: Some(title.clone()),
            title: Some(title),
            picture: self.picture_url(api_base),
            price: Some(self.price.amount()),
            original_price: Some(self.price.amount()),
            discount_percent: self.discount_percent,
            discount_price: self.discount_price,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        [
            self.display_title(),
            self.category.as_str(),
            self.description.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Products whose title, category, or description contain `query`,
/// case-insensitively. A blank query matches everything.
#[must_use]
pub fn search<'a>(products: &'a [CatalogProduct], query: &str) -> Vec<&'a CatalogProduct> {
    let needle = query.trim().to_lowercase();
    products
        .iter()
        .filter(|p| needle.is_empty() || p.matches(&needle))
        .collect()
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// Items on this page.
    pub items: &'a [T],
    /// 1-based page number, clamped into range.
    pub number: usize,
    /// Total number of pages; zero for an empty list.
    pub total_pages: usize,
}

impl<'a, T> Page<'a, T> {
    /// Slice out page `number` (1-based) of `items`.
    ///
    /// Out-of-range page numbers are clamped to the first or last page.
    #[must_use]
    pub fn of(items: &'a [T], number: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = items.len().div_ceil(per_page);
        let number = number.clamp(1, total_pages.max(1));
        let start = (number - 1) * per_page;
        let end = (start + per_page).min(items.len());

        Self {
            items: items.get(start..end).unwrap_or_default(),
            number,
            total_pages,
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// Accept a list as a JSON array, a JSON-encoded array string, or null.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(serde_json::Value::String(text)) => {
            serde_json::from_str(&text).unwrap_or_default()
        }
        _ => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(value: serde_json::Value) -> CatalogProduct {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> Vec<CatalogProduct> {
        vec![
            product(serde_json::json!({
                "id": 1, "title": "Kente Wrap Dress", "category": "Women",
                "description": "Handwoven", "price": 300,
            })),
            product(serde_json::json!({
                "id": 2, "name": "Batakari Smock", "category": "Men",
                "description": "Northern classic", "price": "180.00",
            })),
            product(serde_json::json!({
                "id": 3, "title": "Beaded Sandals", "category": "Accessories",
                "description": "Kente trim", "price": 95.5,
            })),
        ]
    }

    #[test]
    fn test_deserialize_backend_shapes() {
        let p = product(serde_json::json!({
            "id": 7,
            "title": "Ankara Shirt",
            "price": "120",
            "discount_percent": "10",
            "discount_price": 108,
            "sizes": "[\"M\",\"L\"]",
            "colors": ["Blue"],
            "tags": null,
        }));
        assert_eq!(p.id.as_str(), "7");
        assert_eq!(p.sizes, vec!["M", "L"]);
        assert_eq!(p.colors, vec!["Blue"]);
        assert!(p.tags.is_empty());
        assert!(p.has_valid_discount());
        assert_eq!(p.effective_price().amount(), Decimal::from(108));
    }

    #[test]
    fn test_discount_must_be_below_list_price() {
        let p = product(serde_json::json!({
            "id": 1, "title": "x", "price": 50,
            "discount_percent": 10, "discount_price": 50,
        }));
        assert!(!p.has_valid_discount());
        assert_eq!(p.effective_price().amount(), Decimal::from(50));
    }

    #[test]
    fn test_search() {
        let products = sample();
        let ids = |q: &str| -> Vec<String> {
            search(&products, q).iter().map(|p| p.id.to_string()).collect()
        };

        assert_eq!(ids(""), vec!["1", "2", "3"]);
        assert_eq!(ids("KENTE"), vec!["1", "3"]);
        assert_eq!(ids("smock"), vec!["2"]);
        assert_eq!(ids("men"), vec!["1", "2"]);
        assert!(ids("velvet").is_empty());
    }

    #[test]
    fn test_picture_url() {
        let base = Url::parse("http://localhost:5000/").unwrap();
        let mut p = sample().remove(0);
        assert_eq!(p.picture_url(&base), None);

        p.primary_image = Some("/uploads/kente.jpg".to_owned());
        assert_eq!(
            p.picture_url(&base).as_deref(),
            Some("http://localhost:5000/uploads/kente.jpg")
        );

        p.primary_image = Some("https://cdn.example.com/a.png".to_owned());
        assert_eq!(
            p.picture_url(&base).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_to_cart_input_applies_discount() {
        let base = Url::parse("http://localhost:5000/").unwrap();
        let p = product(serde_json::json!({
            "id": 9, "title": "Smock", "price": 200,
            "discount_percent": 25, "discount_price": 150,
        }));

        let line = p.to_cart_input(&base).into_line().unwrap();
        assert_eq!(line.unit_price.amount(), Decimal::from(150));
        assert_eq!(line.original_price.amount(), Decimal::from(200));
        assert_eq!(line.title, "Smock");
    }

    #[test]
    fn test_pagination() {
        let items: Vec<u32> = (1..=45).collect();

        let first = Page::of(&items, 1, PRODUCTS_PER_PAGE);
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total_pages, 3);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = Page::of(&items, 3, PRODUCTS_PER_PAGE);
        assert_eq!(last.items, &items[40..]);
        assert!(last.has_previous());
        assert!(!last.has_next());

        assert_eq!(Page::of(&items, 99, PRODUCTS_PER_PAGE).number, 3);
        assert_eq!(Page::of(&items, 0, PRODUCTS_PER_PAGE).number, 1);
    }

    #[test]
    fn test_pagination_empty() {
        let items: Vec<u32> = Vec::new();
        let page = Page::of(&items, 4, PRODUCTS_PER_PAGE);
        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next());
    }
}
