//! Service layer
//!
//! Provisioning logic kept out of the HTTP handlers.

mod account;

pub use account::AccountService;
