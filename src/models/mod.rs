//! Data models for storefront entities.
//!
//! This module contains the data structures exchanged with the Commerce
//! API, including:
//!
//! - `User`, `Role`, `AuthSession`: account identity and credentials
//! - `Product`, `Page`, `ProductQuery`: catalog browsing
//! - `Cart`, `CartItem`: the shopping cart
//! - `Order`, `OrderItem`, `OrderStatus`: checkout results
//! - `Category`: catalog taxonomy

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem};
pub use category::Category;
pub use order::{Order, OrderItem, OrderStatus};
pub use product::{NewProduct, Page, Product, ProductQuery, ProductUpdate};
pub use user::{AuthSession, Role, User};
