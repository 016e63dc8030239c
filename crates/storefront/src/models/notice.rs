//! User-visible cart notices.
//!
//! The cart store publishes a [`Notice`] after each user-initiated mutation so
//! the view layer can show a toast. Wording matches the web storefront.

/// What happened to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// A new product was added.
    Added,
    /// An existing product's quantity went up.
    QuantityUpdated,
    /// A product was removed.
    Removed,
    /// The cart was emptied.
    Cleared,
}

/// Severity used to style the toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Positive confirmation.
    Success,
    /// Neutral information.
    Info,
}

/// A toast-style message about a cart change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// What happened.
    pub kind: NoticeKind,
    /// Toast heading.
    pub title: String,
    /// Toast body; may be empty.
    pub text: String,
}

impl Notice {
    /// A product was added to the cart.
    #[must_use]
    pub fn added(product_title: &str) -> Self {
        Self {
            kind: NoticeKind::Added,
            title: "Added to Cart!".to_owned(),
            text: format!("{product_title} added to cart"),
        }
    }

    /// An existing line's quantity was incremented.
    #[must_use]
    pub fn quantity_updated(product_title: &str) -> Self {
        Self {
            kind: NoticeKind::QuantityUpdated,
            title: "Updated Cart!".to_owned(),
            text: format!("{product_title} quantity updated"),
        }
    }

    /// A line was removed.
    #[must_use]
    pub fn removed() -> Self {
        Self {
            kind: NoticeKind::Removed,
            title: "Item Removed".to_owned(),
            text: "Item removed from cart".to_owned(),
        }
    }

    /// The cart was emptied.
    #[must_use]
    pub fn cleared() -> Self {
        Self {
            kind: NoticeKind::Cleared,
            title: "Cart Cleared".to_owned(),
            text: String::new(),
        }
    }

    /// Toast severity.
    #[must_use]
    pub const fn level(&self) -> NoticeLevel {
        match self.kind {
            NoticeKind::Removed => NoticeLevel::Info,
            NoticeKind::Added | NoticeKind::QuantityUpdated | NoticeKind::Cleared => {
                NoticeLevel::Success
            }
        }
    }
}
