//! Database Models

// Serde helpers
pub mod serde_helpers;

// Accounts
pub mod user;

// Catalog
pub mod product;

// Orders
pub mod order;

// Re-exports
pub use user::{User, UserCreate, UserId, UserResponse, UserRole, UserUpdate};
pub use product::{Brand, Product, ProductCreate, ProductId, ProductUpdate, Review, ReviewCreate};
pub use order::{
    DEFAULT_PAYMENT_METHOD, Order, OrderCreate, OrderId, OrderItem, OrderItemInput, OrderStatus,
};
