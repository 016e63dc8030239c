//! Domain models for the storefront client.

pub mod cart;
pub mod listing;
pub mod notice;
pub mod session;

pub use cart::{AddOutcome, Cart, CartError, CartLine, ProductInput, QuantityChange};
pub use listing::{ListingError, ListingForm, ListingImage};
pub use notice::{Notice, NoticeKind, NoticeLevel};
pub use session::{AuthenticatedSession, SellerAccess, Session, UserProfile, UserRecord};
