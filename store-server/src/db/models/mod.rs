//! Database models
//!
//! Record links are serialized as "table:id" strings through
//! [`serde_helpers`], matching the API JSON shape.

pub mod serde_helpers;

pub mod cart;
pub mod order;
pub mod product;
pub mod user;
pub mod voucher;

pub use cart::{Cart, CartItem};
pub use order::{
    AppliedVoucher, Order, OrderId, OrderItem, OrderStatus, OrderStatusUpdate,
};
pub use product::{Product, ProductCreate, ProductId, ProductUpdate};
pub use user::{User, UserId, UserPublic, UserRole, UserVoucherEntry};
pub use voucher::{Voucher, VoucherCreate, VoucherId, VoucherUpdate};
