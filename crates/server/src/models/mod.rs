//! Domain models.
//!
//! These types represent validated domain objects separate from database row
//! types. They serialize straight into API responses (camelCase, matching
//! the JSON surface).

pub mod coupon;
pub mod message;
pub mod newsletter;
pub mod notification;
pub mod order;
pub mod product;
pub mod rating;
pub mod testimonial;
pub mod user;
pub mod wishlist;

pub use coupon::Coupon;
pub use message::{Conversation, Message};
pub use newsletter::NewsletterSubscriber;
pub use notification::Notification;
pub use order::{Order, OrderItem, OrderWithItems, TrackingStep};
pub use product::{Product, ProductWithRating};
pub use rating::{Rating, RatingSummary};
pub use testimonial::Testimonial;
pub use user::{PublicUser, Session, User};
pub use wishlist::WishlistItem;
