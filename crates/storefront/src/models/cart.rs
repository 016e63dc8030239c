//! Cart domain types.
//!
//! [`Cart`] is a pure value: an insertion-ordered map from product id to
//! [`CartLine`] plus the quantity arithmetic. Persistence, logging, and
//! observer fan-out live in [`crate::stores::CartStore`].
//!
//! Product payloads arrive loosely typed (numeric or string ids, `title` or
//! `name`, prices as numbers or strings). They are normalised exactly once,
//! in [`ProductInput::into_line`]; everything past that point sees one schema.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use suturahub_core::types::id::RawId;
use suturahub_core::{Price, ProductId};

/// Errors raised by cart operations that the caller must handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The add-to-cart payload is missing an id, a usable price, or a title.
    #[error("invalid product: {0}")]
    InvalidProduct(String),
    /// Adding to this line would make a line or cart total unrepresentable.
    #[error("quantity of {0} is too large for the cart total")]
    TotalOutOfRange(ProductId),
}

// =============================================================================
// Cart Lines
// =============================================================================

/// One product's presence in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Product identifier, unique within the cart.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Display image reference. Not validated.
    pub picture: Option<String>,
    /// Amount charged per unit (discounted price when a discount applies).
    pub unit_price: Price,
    /// List price before discount. Always `>= unit_price`.
    pub original_price: Price,
    /// Informational discount percentage; never used to recompute prices.
    pub discount_percent: Option<Decimal>,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`, or `None` if it does not fit in a `Decimal`.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(self.quantity)
    }

    /// `unit_price × quantity`, saturating at `Decimal::MAX`.
    ///
    /// Lines held by a [`Cart`] never saturate.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.checked_line_total().unwrap_or(Decimal::MAX)
    }

    /// Whether the unit price is below the list price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.unit_price < self.original_price
    }

    /// Amount saved on this line compared to list price.
    #[must_use]
    pub fn savings(&self) -> Decimal {
        (self.original_price.amount() - self.unit_price.amount())
            .saturating_mul(Decimal::from(self.quantity))
    }
}

/// Result of adding a product to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was inserted with quantity 1.
    Added,
    /// The product was already present; its quantity was incremented.
    Incremented {
        /// Quantity after the increment.
        quantity: u32,
    },
}

/// Result of setting a line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The requested quantity was below 1 and the line was removed.
    Removed,
    /// The line now has the requested quantity.
    Updated,
    /// The line already had the requested quantity.
    Unchanged,
    /// The quantity is above `u32::MAX` or would push the cart total out of
    /// range. The line is left as it was.
    OutOfRange,
    /// No line with that id exists.
    Missing,
}

// =============================================================================
// Cart
// =============================================================================

/// Cart contents keyed by product id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: IndexMap<ProductId, CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.get(id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn distinct_lines(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `unit_price × quantity` over all lines, in exact decimal arithmetic.
    ///
    /// Mutations that would overflow are rejected, so this is always exact for
    /// a cart built through [`add`](Self::add), [`set_quantity`](Self::set_quantity)
    /// or [`from_json`](Self::from_json).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::MAX)
    }

    /// The exact total, or `None` if it does not fit in a `Decimal`.
    #[must_use]
    pub fn checked_total(&self) -> Option<Decimal> {
        self.lines
            .values()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.checked_line_total()?))
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }

    /// Total saved against list prices.
    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.lines
            .values()
            .map(CartLine::savings)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Insert a line, or increment the existing line with the same id.
    ///
    /// An existing line keeps its prices; only its quantity changes.
    ///
    /// # Errors
    ///
    /// Returns `CartError::TotalOutOfRange` if the new quantity or cart total
    /// would not be representable. The cart is unchanged in that case.
    pub fn add(&mut self, line: CartLine) -> Result<AddOutcome, CartError> {
        Ok(match self.merge(CartLine { quantity: 1, ..line })? {
            Some(quantity) => AddOutcome::Incremented { quantity },
            None => AddOutcome::Added,
        })
    }

    /// Add `line.quantity` units, merging into an existing line with the same id.
    ///
    /// Returns the merged quantity when the id was already present.
    fn merge(&mut self, line: CartLine) -> Result<Option<u32>, CartError> {
        let id = line.id.clone();
        let Some(current) = self.lines.get(&id).map(|existing| existing.quantity) else {
            self.lines.insert(id.clone(), line);
            if self.checked_total().is_none() {
                self.lines.shift_remove(&id);
                return Err(CartError::TotalOutOfRange(id));
            }
            return Ok(None);
        };

        let quantity = current
            .checked_add(line.quantity)
            .ok_or_else(|| CartError::TotalOutOfRange(id.clone()))?;
        self.apply_quantity(&id, quantity)?;
        Ok(Some(quantity))
    }

    /// Set an existing line's quantity, rolling back if the total overflows.
    fn apply_quantity(&mut self, id: &ProductId, quantity: u32) -> Result<(), CartError> {
        let Some(line) = self.lines.get_mut(id) else {
            return Ok(());
        };
        let previous = std::mem::replace(&mut line.quantity, quantity);
        if self.checked_total().is_none() {
            if let Some(line) = self.lines.get_mut(id) {
                line.quantity = previous;
            }
            return Err(CartError::TotalOutOfRange(id.clone()));
        }
        Ok(())
    }

    /// Remove a line, preserving the order of the others.
    pub fn remove(&mut self, id: &ProductId) -> Option<CartLine> {
        self.lines.shift_remove(id)
    }

    /// Set a line's quantity to exactly `quantity`. Values below 1 remove it.
    ///
    /// Quantities that do not fit in a `u32`, or that would overflow the cart
    /// total, are rejected with [`QuantityChange::OutOfRange`].
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> QuantityChange {
        if quantity < 1 {
            return if self.remove(id).is_some() {
                QuantityChange::Removed
            } else {
                QuantityChange::Missing
            };
        }

        let Some(current) = self.lines.get(id).map(|line| line.quantity) else {
            return QuantityChange::Missing;
        };
        let Ok(quantity) = u32::try_from(quantity) else {
            return QuantityChange::OutOfRange;
        };
        if current == quantity {
            return QuantityChange::Unchanged;
        }
        match self.apply_quantity(id, quantity) {
            Ok(()) => QuantityChange::Updated,
            Err(_) => QuantityChange::OutOfRange,
        }
    }

    /// Remove every line. Returns `false` if the cart was already empty.
    pub fn clear(&mut self) -> bool {
        let had_lines = !self.lines.is_empty();
        self.lines.clear();
        had_lines
    }

    /// Encode as the persisted JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let stored: Vec<StoredCartLine> = self.lines.values().map(StoredCartLine::from).collect();
        serde_json::to_string(&stored)
    }

    /// Decode the persisted JSON array.
    ///
    /// The document as a whole must be a JSON array. Individual records that
    /// cannot be read are skipped; a missing quantity counts as 1, quantities
    /// below 1 are dropped, and repeated ids are merged into the first record.
    /// Records whose quantity would overflow the cart total are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not a JSON array.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<serde_json::Value> = serde_json::from_str(text)?;
        let mut cart = Self::new();

        for (index, record) in records.into_iter().enumerate() {
            let stored = match serde_json::from_value::<StoredCartLine>(record) {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable cart record");
                    continue;
                }
            };
            let Some(line) = stored.into_line() else {
                continue;
            };
            if let Err(e) = cart.merge(line) {
                tracing::warn!(index, error = %e, "Skipping out-of-range cart record");
            }
        }

        Ok(cart)
    }
}

// =============================================================================
// Persisted Record
// =============================================================================

/// A cart line as written to storage.
///
/// Field names follow the persisted layout shared with the web client, which
/// writes the display title under both `name` and `title`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCartLine {
    id: ProductId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    price: Price,
    #[serde(rename = "originalPrice", default)]
    original_price: Option<Price>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    discount_percent: Option<Decimal>,
    #[serde(default, skip_deserializing)]
    discount_price: Option<Price>,
    #[serde(default)]
    quantity: Option<i64>,
}

impl StoredCartLine {
    fn into_line(self) -> Option<CartLine> {
        let quantity = match self.quantity {
            None => 1,
            Some(q) if q < 1 => return None,
            Some(q) => u32::try_from(q).ok()?,
        };
        let unit_price = self.price;
        let original_price = self
            .original_price
            .filter(|original| *original >= unit_price)
            .unwrap_or(unit_price);

        Some(CartLine {
            id: self.id,
            title: self.title.or(self.name).unwrap_or_default(),
            picture: self.picture,
            unit_price,
            original_price,
            discount_percent: self.discount_percent,
            quantity,
        })
    }
}

impl From<&CartLine> for StoredCartLine {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.clone(),
            name: Some(line.title.clone()),
            title: Some(line.title.clone()),
            picture: line.picture.clone(),
            price: line.unit_price,
            original_price: Some(line.original_price),
            discount_percent: line.discount_percent,
            discount_price: line.is_discounted().then_some(line.unit_price),
            quantity: Some(i64::from(line.quantity)),
        }
    }
}

// =============================================================================
// Add-to-cart Input
// =============================================================================

/// A product as handed to `add_item` by a product card or the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    /// Product id; numbers are coerced to strings.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Alternate display title used by some payloads.
    #[serde(default)]
    pub name: Option<String>,
    /// Display image reference.
    #[serde(default)]
    pub picture: Option<String>,
    /// List price.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    /// Explicit list price when `price` is already discounted.
    #[serde(
        default,
        rename = "originalPrice",
        alias = "original_price",
        deserialize_with = "lenient_decimal"
    )]
    pub original_price: Option<Decimal>,
    /// Discount percentage advertised for the product.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub discount_percent: Option<Decimal>,
    /// Discounted unit price.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub discount_price: Option<Decimal>,
}

impl ProductInput {
    /// Start an input with the three required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            price: Some(price),
            ..Self::default()
        }
    }

    /// Attach a discount.
    #[must_use]
    pub fn with_discount(mut self, percent: Decimal, discount_price: Decimal) -> Self {
        self.discount_percent = Some(percent);
        self.discount_price = Some(discount_price);
        self
    }

    /// Attach a display image.
    #[must_use]
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// The discounted price, if the discount on this input is usable.
    ///
    /// A discount counts only when its percentage is positive and its price
    /// is non-negative and strictly below `list`.
    fn valid_discount(&self, list: Price) -> Option<Price> {
        let percent = self.discount_percent?;
        let price = Price::new(self.discount_price?).ok()?;
        (percent > Decimal::ZERO && price < list).then_some(price)
    }

    /// Normalise into a cart line with quantity 1.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidProduct` if the id is missing or blank, the
    /// price is missing or negative, or neither `title` nor `name` is present.
    pub fn into_line(self) -> Result<CartLine, CartError> {
        let id = self
            .id
            .as_deref()
            .and_then(ProductId::parse)
            .ok_or_else(|| CartError::InvalidProduct("product must have an id".to_owned()))?;

        let list = self
            .price
            .ok_or_else(|| CartError::InvalidProduct(format!("product {id} has no price")))
            .and_then(|amount| {
                Price::new(amount)
                    .map_err(|e| CartError::InvalidProduct(format!("product {id}: {e}")))
            })?;

        let unit_price = self.valid_discount(list).unwrap_or(list);
        let original_price = self
            .original_price
            .and_then(|amount| Price::new(amount).ok())
            .filter(|original| *original >= unit_price)
            .unwrap_or(list);

        let title = self
            .title
            .or(self.name)
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CartError::InvalidProduct(format!("product {id} has no title")))?;

        Ok(CartLine {
            id,
            title,
            picture: self.picture,
            unit_price,
            original_price,
            discount_percent: self.discount_percent.filter(|p| *p > Decimal::ZERO),
            quantity: 1,
        })
    }
}

/// Accept an id as a JSON string or integer.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_key))
}

/// Accept a decimal as a JSON number or string; blank or unparseable text is `None`.
pub(crate) fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.to_string().parse().ok(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
