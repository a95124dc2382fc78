//! Infrastructure Layer
//!
//! Database implementation of the credential store interface.

pub mod postgres;

pub use postgres::PgUserRepository;
