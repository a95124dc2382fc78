//! Value Objects
//!
//! Validated, immutable domain primitives.

pub mod email;
pub mod person_name;
pub mod phone;
pub mod user_id;
pub mod user_password;
pub mod user_role;

pub use email::Email;
pub use person_name::PersonName;
pub use phone::Phone;
pub use user_id::UserId;
pub use user_password::{RawPassword, UserPassword};
pub use user_role::{Capability, UserRole};
