//! Catalog records
//!
//! Plain data types stored by the in-memory services. Relations are kept as
//! ids; rows that need related data for search or representation carry a
//! `#[serde(skip)]` slot that resources hydrate before use.

pub mod macros;

pub mod attribute;
pub mod category;
pub mod image;
pub mod product;
pub mod tag;
pub mod user;

pub use attribute::ProductAttribute;
pub use category::Category;
pub use image::ProductImage;
pub use product::{Product, ProductRelations, ReceiveType};
pub use tag::Tag;
pub use user::{ReadUser, User};
