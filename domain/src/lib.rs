pub mod catalog;
pub mod contact;
pub mod core;
pub mod purchase;
pub mod session;
pub mod user;
pub mod validation;

pub use database_adapter::KeyValueStore;
