pub mod address;
pub mod cart;
pub mod collection;
pub mod customer;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use address::Address;
pub use cart::{Cart, CartLine};
pub use collection::{Collection, CollectionWithCount};
pub use customer::{Customer, Membership};
pub use order::{Order, OrderDetail, OrderLine, PaymentStatus};
pub use product::{InventoryStatus, Product, ProductImage, ProductWithCollection};
pub use review::Review;
pub use user::User;
