//! Cart store.
//!
//! Owns the single shared [`Cart`]. Every mutation runs to completion under
//! the store lock: apply in memory, write the full cart to storage, and queue
//! the new snapshot with its [`Notice`]. The queue is drained after the lock is
//! released, so snapshots reach subscribers in commit order even when a
//! subscriber mutates the cart.
//!
//! Storage failures are logged and otherwise ignored. The in-memory cart stays
//! authoritative for the rest of the session and the next mutation writes the
//! whole cart again.

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::instrument;

use suturahub_core::ProductId;

use crate::binding::{Observable, Outbox, SubscriptionId, Subscribers};
use crate::error::add_breadcrumb;
use crate::models::cart::{AddOutcome, Cart, CartError, ProductInput, QuantityChange};
use crate::models::notice::Notice;
use crate::storage::{Storage, keys};

/// Observable, persisted shopping cart.
pub struct CartStore {
    storage: Arc<dyn Storage>,
    cart: Mutex<Cart>,
    subscribers: Subscribers<Cart>,
    notices: Subscribers<Notice>,
    outbox: Outbox<(Cart, Option<Notice>)>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &*self.lock())
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create the store from whatever cart is persisted in `storage`.
    ///
    /// A missing, unreadable, or malformed cart yields an empty cart.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let cart = match storage.get(keys::CART) {
            Ok(Some(text)) => Cart::from_json(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Persisted cart is corrupt, starting empty");
                Cart::new()
            }),
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read persisted cart, starting empty");
                Cart::new()
            }
        };

        tracing::debug!(
            lines = cart.distinct_lines(),
            items = cart.item_count(),
            "Cart store loaded"
        );

        Self {
            storage,
            cart: Mutex::new(cart),
            subscribers: Subscribers::new(),
            notices: Subscribers::new(),
            outbox: Outbox::new(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product.
    ///
    /// A product already in the cart has its quantity incremented and keeps
    /// the prices it was first added with.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidProduct` if the payload cannot be normalised,
    /// or `CartError::TotalOutOfRange` if one more unit would overflow the
    /// cart total. Nothing is changed or persisted in either case.
    #[instrument(skip(self, product), fields(product_id = ?product.id))]
    pub fn add_item(&self, product: ProductInput) -> Result<AddOutcome, CartError> {
        let line = product.into_line().inspect_err(|e| {
            tracing::debug!(error = %e, "Rejected add-to-cart");
        })?;
        let title = line.title.clone();
        let id = line.id.clone();

        let outcome = self
            .commit(|cart| {
                let outcome = cart.add(line)?;
                let notice = match outcome {
                    AddOutcome::Added => Notice::added(&title),
                    AddOutcome::Incremented { .. } => Notice::quantity_updated(&title),
                };
                Ok((outcome, Some(notice)))
            })
            .inspect_err(|e| tracing::warn!(error = %e, "Rejected add-to-cart"))?;

        tracing::debug!(?outcome, "Cart item added");
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
        Ok(outcome)
    }

    /// Remove a product's line. Removing an absent product is a no-op.
    ///
    /// Returns whether a line was removed.
    #[instrument(skip(self))]
    pub fn remove_item(&self, id: &ProductId) -> bool {
        let removed = self.commit(|cart| match cart.remove(id) {
            Some(_) => Ok(((), Some(Notice::removed()))),
            None => Err(()),
        });
        if removed.is_ok() {
            add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", id.as_str())]));
        }
        removed.is_ok()
    }

    /// Set a line's quantity to exactly `quantity`.
    ///
    /// Values below 1 behave as [`remove_item`](Self::remove_item). Absent ids,
    /// unchanged quantities, and out-of-range quantities are no-ops and are not
    /// persisted.
    #[instrument(skip(self))]
    pub fn set_quantity(&self, id: &ProductId, quantity: i64) -> QuantityChange {
        self.commit(|cart| match cart.set_quantity(id, quantity) {
            QuantityChange::Removed => Ok((QuantityChange::Removed, Some(Notice::removed()))),
            QuantityChange::Updated => Ok((QuantityChange::Updated, None)),
            unchanged => Err(unchanged),
        })
        .unwrap_or_else(|unchanged| {
            if unchanged == QuantityChange::OutOfRange {
                tracing::warn!(quantity, "Rejected out-of-range quantity");
            }
            unchanged
        })
    }

    /// Empty the cart.
    ///
    /// Unconditional: any confirmation prompt belongs to the caller.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let Ok(had_lines) =
            self.commit::<_, Infallible>(|cart| Ok((cart.clear(), Some(Notice::cleared()))));
        tracing::debug!(had_lines, "Cart cleared");
        add_breadcrumb("cart", "Cleared cart", None);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Sum of `unit_price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock().total()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lock().item_count()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // =========================================================================
    // Notices
    // =========================================================================

    /// Receive a [`Notice`] after each user-visible cart change.
    pub fn subscribe_notices<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Notice) + Send + Sync + 'static,
    {
        self.notices.add(callback)
    }

    /// Stop receiving notices.
    pub fn unsubscribe_notices(&self, id: SubscriptionId) -> bool {
        self.notices.remove(id)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `mutate` under the lock.
    ///
    /// `Ok` means the cart changed: it is persisted and the snapshot, with the
    /// notice, is queued and delivered. `Err` means nothing changed and nothing
    /// is written or published.
    fn commit<R, E>(
        &self,
        mutate: impl FnOnce(&mut Cart) -> Result<(R, Option<Notice>), E>,
    ) -> Result<R, E> {
        let result = {
            let mut cart = self.lock();
            let (result, notice) = mutate(&mut cart)?;
            self.persist(&cart);
            self.outbox.push((cart.clone(), notice));
            result
        };
        self.flush();
        Ok(result)
    }

    fn persist(&self, cart: &Cart) {
        let result = cart
            .to_json()
            .map_err(crate::storage::StorageError::from)
            .and_then(|json| self.storage.set(keys::CART, &json));

        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to persist cart, keeping in-memory state");
        }
    }

    fn flush(&self) {
        self.outbox.drain(|(snapshot, notice)| {
            self.subscribers.notify(&snapshot);
            if let Some(notice) = notice {
                self.notices.notify(&notice);
            }
        });
    }
}

impl Observable for CartStore {
    type State = Cart;

    fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Cart) + Send + Sync + 'static,
    {
        let id = self.subscribers.add(callback);
        let current = self.snapshot();
        self.subscribers.notify_one(id, &current);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }
}
