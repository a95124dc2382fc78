//! Domain Entities

pub mod user;

pub use user::{Address, LockoutUpdate, Preferences, User, UserProfile};
