//! Ledger domain errors
//!
//! Errors are grouped the way callers react to them: the submission was
//! malformed, the caller may not touch the accounts, a business rule
//! refused the movement, the thing asked for does not exist, or storage
//! contention/failure got in the way.

use thiserror::Error;

use core_kernel::{AccountId, Currency, MinorUnits, PortError, TransactionId};

/// Structural problems with a proposed entry set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer than two entries, or more than an entry position can index
    #[error("Invalid entry count {count}: a transaction needs at least 2 entries")]
    InvalidEntryCount { count: usize },

    /// An entry moves nothing
    #[error("Entry at position {index} has a zero amount")]
    ZeroAmountEntry { index: usize },

    /// Entry amounts do not sum to zero
    #[error("Unbalanced transaction: entries sum to {sum}")]
    UnbalancedTransaction { sum: MinorUnits },
}

/// The caller may not move funds through the referenced accounts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Forbidden: account {account_id} is not owned by the caller")]
    Forbidden { account_id: AccountId },

    #[error("Currency mismatch: entries span {currencies:?}")]
    CurrencyMismatch { currencies: Vec<Currency> },
}

/// Movements that are well-formed and authorized but not allowed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusinessRuleError {
    #[error("Insufficient balance in {account_id}: balance {current}, debit {required_magnitude}")]
    InsufficientBalance {
        account_id: AccountId,
        current: MinorUnits,
        required_magnitude: MinorUnits,
    },
}

/// Errors returned by every exposed ledger operation
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    BusinessRule(#[from] BusinessRuleError),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Lock acquisition timeout or serialization failure under contention
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[source] PortError),
}

impl LedgerError {
    /// Stable machine-readable name of the error
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation(ValidationError::InvalidEntryCount { .. }) => "invalid_entry_count",
            LedgerError::Validation(ValidationError::ZeroAmountEntry { .. }) => "zero_amount_entry",
            LedgerError::Validation(ValidationError::UnbalancedTransaction { .. }) => "unbalanced_transaction",
            LedgerError::Authorization(AuthorizationError::AccountNotFound(_)) => "account_not_found",
            LedgerError::Authorization(AuthorizationError::Forbidden { .. }) => "forbidden",
            LedgerError::Authorization(AuthorizationError::CurrencyMismatch { .. }) => "currency_mismatch",
            LedgerError::BusinessRule(BusinessRuleError::InsufficientBalance { .. }) => "insufficient_balance",
            LedgerError::TransactionNotFound(_) => "transaction_not_found",
            LedgerError::Conflict(_) => "conflict",
            LedgerError::Storage(_) => "storage",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, LedgerError::Authorization(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, LedgerError::Authorization(AuthorizationError::Forbidden { .. }))
    }

    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, LedgerError::BusinessRule(BusinessRuleError::InsufficientBalance { .. }))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Conflict(_))
    }

    /// True for a missing transaction or a missing account
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::TransactionNotFound(_)
                | LedgerError::Authorization(AuthorizationError::AccountNotFound(_))
        )
    }
}

impl From<PortError> for LedgerError {
    fn from(error: PortError) -> Self {
        if error.is_conflict() {
            LedgerError::Conflict(error.to_string())
        } else {
            LedgerError::Storage(error)
        }
    }
}
