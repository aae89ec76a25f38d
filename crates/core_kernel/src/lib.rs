//! Core Kernel - Foundational types shared by every ledger crate
//!
//! This crate provides the building blocks used across the workspace:
//! - Exact minor-unit amounts backed by arbitrary-precision integers
//! - Currency codes and currency-tagged money
//! - Strongly-typed identifiers
//! - Port plumbing for the storage adapters

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, MinorUnits, Currency, MoneyError};
pub use identifiers::{AccountId, TransactionId, LedgerEntryId, ActorId};
pub use error::CoreError;
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
