//! Seller product listing form.
//!
//! Mirrors the seller "sell a product" screen: the form is validated as a
//! whole (every problem reported at once), then encoded as multipart fields
//! for `POST /api/products/create`.

use std::path::Path;

use rust_decimal::Decimal;
use thiserror::Error;

use suturahub_core::{Price, UserId};

/// Highest discount a seller may set, in percent.
const MAX_DISCOUNT_PERCENT: u32 = 99;

/// Errors raised while preparing a listing.
#[derive(Debug, Error)]
pub enum ListingError {
    /// One or more form fields are invalid. Messages are user-facing.
    #[error("listing is invalid: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// An image file could not be read.
    #[error("could not read image {path}: {source}")]
    Image {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Array fields could not be encoded.
    #[error("could not encode listing: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An image attached to a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingImage {
    /// File name sent with the part.
    pub file_name: String,
    /// MIME type of the bytes.
    pub content_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl ListingImage {
    /// Read an image from disk, guessing the MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns `ListingError::Image` if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, ListingError> {
        let bytes = std::fs::read(path).map_err(|source| ListingError::Image {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_owned(), |n| n.to_string_lossy().into_owned());
        let content_type = match path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        };

        Ok(Self {
            file_name,
            content_type: content_type.to_owned(),
            bytes,
        })
    }
}

/// A seller's new product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingForm {
    pub category: String,
    pub sub_category: String,
    pub title: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub delivery_time: String,
    /// Present when the seller enabled a discount.
    pub discount_percent: Option<Decimal>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
}

impl ListingForm {
    /// Add a size if not already selected, or remove it if it is.
    pub fn toggle_size(&mut self, size: &str) {
        toggle(&mut self.sizes, size);
    }

    /// Add a colour if not already selected, or remove it if it is.
    pub fn toggle_color(&mut self, color: &str) {
        toggle(&mut self.colors, color);
    }

    /// Add a tag. Blank and duplicate tags are ignored.
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_owned());
        }
    }

    /// The price after discount, rounded to two decimals.
    ///
    /// `None` when no discount is set or the price or percentage is not positive.
    #[must_use]
    pub fn discounted_price(&self) -> Option<Price> {
        let percent = self.discount_percent.filter(|p| *p > Decimal::ZERO)?;
        let price = self
            .price
            .filter(|p| *p > Decimal::ZERO)
            .and_then(|p| Price::new(p).ok())?;
        Some(price.discounted_by(percent))
    }

    /// Check every field, reporting all problems together.
    ///
    /// # Errors
    ///
    /// Returns `ListingError::Invalid` with one message per failed rule.
    pub fn validate(&self, images: &[ListingImage]) -> Result<(), ListingError> {
        let mut errors = Vec::new();

        if self.category.trim().is_empty() {
            errors.push("Category is required".to_owned());
        }
        if self.sub_category.trim().is_empty() {
            errors.push("Sub Category is required".to_owned());
        }
        if self.title.trim().is_empty() {
            errors.push("Product title is required".to_owned());
        }
        if self.description.trim().is_empty() {
            errors.push("Description is required".to_owned());
        }
        if !self.price.is_some_and(|p| p > Decimal::ZERO) {
            errors.push("Valid price is required".to_owned());
        }
        if !self.quantity.is_some_and(|q| q > 0) {
            errors.push("Valid quantity is required".to_owned());
        }
        if self.sizes.is_empty() {
            errors.push("At least one size must be selected".to_owned());
        }
        if self.colors.is_empty() {
            errors.push("At least one color must be selected".to_owned());
        }
        if self.delivery_time.trim().is_empty() {
            errors.push("Delivery time is required".to_owned());
        }
        if images.is_empty() {
            errors.push("At least one product image is required".to_owned());
        }

        if let Some(percent) = self.discount_percent {
            if percent <= Decimal::ZERO {
                errors.push(
                    "Valid discount percentage is required when discount is enabled".to_owned(),
                );
            } else if percent >= Decimal::ONE_HUNDRED {
                errors.push("Discount percentage must be less than 100%".to_owned());
            } else if percent > Decimal::from(MAX_DISCOUNT_PERCENT) {
                errors.push(format!(
                    "Discount percentage cannot exceed {MAX_DISCOUNT_PERCENT}%"
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ListingError::Invalid(errors))
        }
    }

    /// Encode the text fields of the multipart request.
    ///
    /// Discount fields are sent as empty strings when no discount applies;
    /// sizes, colours and tags are JSON-encoded arrays.
    ///
    /// # Errors
    ///
    /// Returns `ListingError::Encode` if an array cannot be encoded.
    pub fn multipart_fields(
        &self,
        seller_id: &UserId,
    ) -> Result<Vec<(&'static str, String)>, ListingError> {
        let (discount_percent, discount_price) = match (self.discount_percent, self.discounted_price()) {
            (Some(percent), Some(price)) => (percent.normalize().to_string(), price.amount().to_string()),
            _ => (String::new(), String::new()),
        };

        Ok(vec![
            ("seller_id", seller_id.to_string()),
            ("title", self.title.trim().to_owned()),
            ("description", self.description.trim().to_owned()),
            ("category", self.category.clone()),
            ("sub_category", self.sub_category.clone()),
            (
                "price",
                self.price.map(|p| p.normalize().to_string()).unwrap_or_default(),
            ),
            (
                "quantity",
                self.quantity.map(|q| q.to_string()).unwrap_or_default(),
            ),
            ("delivery_time", self.delivery_time.clone()),
            ("discount_percent", discount_percent),
            ("discount_price", discount_price),
            ("sizes", serde_json::to_string(&self.sizes)?),
            ("colors", serde_json::to_string(&self.colors)?),
            ("tags", serde_json::to_string(&self.tags)?),
        ])
    }
}

fn toggle(values: &mut Vec<String>, value: &str) {
    if let Some(index) = values.iter().position(|v| v == value) {
        values.remove(index);
    } else {
        values.push(value.to_owned());
    }
}
