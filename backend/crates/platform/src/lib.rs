//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random tokens, SHA-256, hex)
//! - Password hashing (Argon2id with a storefront password policy)
//! - Cookie management

pub mod cookie;
pub mod crypto;
pub mod password;
