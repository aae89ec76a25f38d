//! Account DTOs

use core_kernel::{AccountId, Currency, MinorUnits};
use domain_ledger::{AccountBalance, BalanceReconciliation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account_id: AccountId,
    pub balance: MinorUnits,
    pub currency: Currency,
}

impl From<AccountBalance> for BalanceResponse {
    fn from(balance: AccountBalance) -> Self {
        Self {
            account_id: balance.account_id,
            balance: balance.balance,
            currency: balance.currency,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecomputeQuery {
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecomputeResponse {
    pub account_id: AccountId,
    pub recomputed: MinorUnits,
    pub cached: MinorUnits,
    pub in_sync: bool,
    pub repaired: bool,
}

impl From<BalanceReconciliation> for RecomputeResponse {
    fn from(report: BalanceReconciliation) -> Self {
        Self {
            account_id: report.account_id,
            recomputed: report.recomputed,
            cached: report.cached,
            in_sync: report.in_sync,
            repaired: report.repaired,
        }
    }
}
