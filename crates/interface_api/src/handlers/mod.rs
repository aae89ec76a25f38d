//! Request handlers

pub mod health;
pub mod transactions;
pub mod accounts;
