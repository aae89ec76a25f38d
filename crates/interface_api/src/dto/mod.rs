//! Request and response bodies
//!
//! Amounts travel as decimal-digit strings so they survive JSON clients
//! that parse numbers as doubles.

pub mod transactions;
pub mod accounts;
