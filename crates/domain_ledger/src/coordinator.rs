//! Transaction coordinator
//!
//! The coordinator is the only component allowed to write ledger state.
//! A submission moves through
//! `Validating → Authorizing → PreChecking → Persisting → Committed`, and any
//! failure ends in `Aborted`.
//!
//! Everything before `Persisting` only reads. Inside `Persisting` a single
//! unit of work inserts the transaction and its entries, then locks each
//! touched account in ascending id order, re-checks the projected balance
//! against the locked row and writes it. Any failure rolls the whole unit
//! back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{
    AccountId, ActorId, Currency, HealthCheckResult, HealthCheckable, MinorUnits, TransactionId,
};

use crate::account::Account;
use crate::authorization::{AuthorizationGuard, ResolvedAccounts};
use crate::error::{AuthorizationError, LedgerError};
use crate::ports::{
    AccountStore, LedgerStorage, LedgerStore, Page, PageRequest, TransactionStore, UnitOfWork,
    UnitOfWorkProvider,
};
use crate::projection::{BalanceProjector, BalanceReconciliation};
use crate::transaction::{ActorType, ProposedEntry, Transaction};
use crate::validation::EntryValidator;

/// Progress of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Validating,
    Authorizing,
    PreChecking,
    Persisting,
    Committed,
    Aborted,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Validating => "validating",
            SubmissionState::Authorizing => "authorizing",
            SubmissionState::PreChecking => "pre_checking",
            SubmissionState::Persisting => "persisting",
            SubmissionState::Committed => "committed",
            SubmissionState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Logs state transitions of a submission
struct SubmissionTracker {
    state: SubmissionState,
}

impl SubmissionTracker {
    fn start() -> Self {
        debug!(state = %SubmissionState::Validating, "Submission started");
        Self {
            state: SubmissionState::Validating,
        }
    }

    fn advance(&mut self, next: SubmissionState) {
        debug!(from = %self.state, to = %next, "Submission state changed");
        self.state = next;
    }

    /// Passes `result` through, moving to `Aborted` on error
    fn check<T>(&mut self, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
        if let Err(error) = &result {
            warn!(state = %self.state, kind = error.kind(), %error, "Submission aborted");
            self.state = SubmissionState::Aborted;
        }
        result
    }
}

/// Pagination bounds for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl ListingLimits {
    /// Resolves optional paging input into a bounded request
    ///
    /// Page 0 is treated as page 1; the limit is clamped to `1..=max_limit`.
    pub fn page_request(&self, page: Option<u32>, limit: Option<u32>) -> PageRequest {
        let max_limit = self.max_limit.max(1);
        let limit = limit.unwrap_or(self.default_limit).clamp(1, max_limit);
        PageRequest::new(page.unwrap_or(1), limit)
    }
}

/// Listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Narrow to transactions touching this account
    pub account_id: Option<AccountId>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TransactionFilter {
    pub fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            ..Default::default()
        }
    }

    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }
}

/// Cached balance of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub balance: MinorUnits,
    pub currency: Currency,
}

impl From<&Account> for AccountBalance {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            balance: account.balance.clone(),
            currency: account.currency,
        }
    }
}

/// Orchestrates validation, authorization, projection and atomic persistence
#[derive(Clone)]
pub struct TransactionCoordinator {
    storage: Arc<dyn LedgerStorage>,
    validator: EntryValidator,
    guard: AuthorizationGuard,
    projector: BalanceProjector,
    limits: ListingLimits,
}

impl TransactionCoordinator {
    /// Creates a coordinator over the given storage
    pub fn new(storage: Arc<dyn LedgerStorage>) -> Self {
        Self {
            storage,
            validator: EntryValidator::new(),
            guard: AuthorizationGuard::new(),
            projector: BalanceProjector::new(),
            limits: ListingLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ListingLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> ListingLimits {
        self.limits
    }

    /// Validates, authorizes and atomically commits a group of entries
    ///
    /// Returns the committed transaction with its entries in submission
    /// order. Errors raised before persistence leave no trace; errors raised
    /// during persistence roll the unit of work back.
    #[instrument(
        skip(self, description, entries),
        fields(actor_id = %actor_id, entry_count = entries.len())
    )]
    pub async fn submit(
        &self,
        description: &str,
        actor_id: ActorId,
        actor_type: ActorType,
        entries: Vec<ProposedEntry>,
    ) -> Result<Transaction, LedgerError> {
        let mut tracker = SubmissionTracker::start();

        let validated = tracker.check(self.validator.validate(entries).map_err(LedgerError::from))?;

        tracker.advance(SubmissionState::Authorizing);
        let resolved = tracker.check(
            self.guard
                .authorize(self.storage.as_ref(), &validated, actor_id)
                .await,
        )?;

        tracker.advance(SubmissionState::PreChecking);
        let net = validated.net_by_account();
        tracker.check(self.pre_check(&resolved, &net))?;

        tracker.advance(SubmissionState::Persisting);
        let transaction = tracker.check(
            Transaction::from_proposed(description, actor_id, actor_type, validated.entries())
                .map_err(LedgerError::from),
        )?;
        tracker.check(self.persist(&transaction, &net).await)?;

        tracker.advance(SubmissionState::Committed);
        info!(transaction_id = %transaction.id, "Transaction committed");
        Ok(transaction)
    }

    /// Fail-fast projection against read-time snapshots
    fn pre_check(
        &self,
        resolved: &ResolvedAccounts,
        net: &BTreeMap<AccountId, MinorUnits>,
    ) -> Result<(), LedgerError> {
        for (account_id, delta) in net {
            let account = resolved
                .get(account_id)
                .ok_or(AuthorizationError::AccountNotFound(*account_id))?;
            self.projector.apply(account, delta)?;
        }
        Ok(())
    }

    async fn persist(
        &self,
        transaction: &Transaction,
        net: &BTreeMap<AccountId, MinorUnits>,
    ) -> Result<(), LedgerError> {
        let mut unit = self.storage.begin().await?;
        let outcome = write_transaction(unit.as_mut(), &self.projector, transaction, net).await;
        finish(unit, outcome).await
    }

    /// Loads a transaction the actor may see
    #[instrument(skip(self), fields(transaction_id = %id, actor_id = %actor_id))]
    pub async fn get_by_id(
        &self,
        id: TransactionId,
        actor_id: ActorId,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self
            .storage
            .find_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;

        let ids: Vec<AccountId> = transaction.account_ids().into_iter().collect();
        let accounts = self.storage.find_accounts(&ids).await?;
        for account_id in ids {
            let owned = accounts
                .iter()
                .any(|a| a.id == account_id && a.is_owned_by(actor_id));
            if !owned {
                return Err(AuthorizationError::Forbidden { account_id }.into());
            }
        }

        Ok(transaction)
    }

    /// Lists transactions touching the actor's accounts, newest first
    #[instrument(skip(self), fields(actor_id = %actor_id))]
    pub async fn list(
        &self,
        filter: TransactionFilter,
        actor_id: ActorId,
    ) -> Result<Page<Transaction>, LedgerError> {
        if let Some(account_id) = filter.account_id {
            self.owned_account(account_id, actor_id).await?;
        }

        let request = self.limits.page_request(filter.page, filter.limit);
        let page = self
            .storage
            .transactions_by_owner(actor_id, filter.account_id, request)
            .await?;
        debug!(returned = page.items.len(), total = page.total, "Listed transactions");
        Ok(page)
    }

    /// Returns the cached balance of an account
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_balance(&self, account_id: AccountId) -> Result<AccountBalance, LedgerError> {
        let account = self
            .storage
            .find_account(account_id)
            .await?
            .ok_or(AuthorizationError::AccountNotFound(account_id))?;
        Ok(AccountBalance::from(&account))
    }

    /// Returns the cached balance of an account owned by `actor_id`
    #[instrument(skip(self), fields(account_id = %account_id, actor_id = %actor_id))]
    pub async fn get_owned_balance(
        &self,
        account_id: AccountId,
        actor_id: ActorId,
    ) -> Result<AccountBalance, LedgerError> {
        let account = self.owned_account(account_id, actor_id).await?;
        Ok(AccountBalance::from(&account))
    }

    /// Recomputes an account balance from its entry history
    ///
    /// Without `persist` this is a read-only audit; reads are not taken under
    /// a lock, so a submission committing in between can show up as
    /// transient drift. With `persist` the account is locked for the
    /// duration and the cached balance is overwritten only when it differs.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn recompute_balance(
        &self,
        account_id: AccountId,
        persist: bool,
    ) -> Result<BalanceReconciliation, LedgerError> {
        if !persist {
            let account = self
                .storage
                .find_account(account_id)
                .await?
                .ok_or(AuthorizationError::AccountNotFound(account_id))?;
            let entries = self.storage.entries_by_account(account_id).await?;
            let report = self.projector.reconcile(&account, &entries);
            if !report.in_sync {
                warn!(
                    recomputed = %report.recomputed,
                    cached = %report.cached,
                    "Balance drift detected"
                );
            }
            return Ok(report);
        }

        let mut unit = self.storage.begin().await?;
        let outcome = repair_balance(unit.as_mut(), &self.projector, account_id).await;
        finish(unit, outcome).await
    }

    /// Reports storage health
    pub async fn health(&self) -> HealthCheckResult {
        self.storage.health_check().await
    }

    async fn owned_account(&self, account_id: AccountId, actor_id: ActorId) -> Result<Account, LedgerError> {
        let account = self
            .storage
            .find_account(account_id)
            .await?
            .ok_or(AuthorizationError::AccountNotFound(account_id))?;
        if !account.is_owned_by(actor_id) {
            return Err(AuthorizationError::Forbidden { account_id }.into());
        }
        Ok(account)
    }
}

/// The write path of a submission, inside one unit of work
async fn write_transaction(
    unit: &mut dyn UnitOfWork,
    projector: &BalanceProjector,
    transaction: &Transaction,
    net: &BTreeMap<AccountId, MinorUnits>,
) -> Result<(), LedgerError> {
    unit.insert_transaction(transaction).await?;
    for entry in &transaction.entries {
        unit.insert_entry(entry).await?;
    }

    // BTreeMap iteration is ascending by account id, which fixes the lock order
    for (account_id, delta) in net {
        let account = unit
            .lock_account(*account_id)
            .await?
            .ok_or(AuthorizationError::AccountNotFound(*account_id))?;
        let projected = projector.apply(&account, delta)?;
        debug!(account_id = %account_id, balance = %projected, "Balance projected under lock");
        unit.update_balance(*account_id, &projected).await?;
    }
    Ok(())
}

/// Recompute under lock, writing only when the cached balance drifted
async fn repair_balance(
    unit: &mut dyn UnitOfWork,
    projector: &BalanceProjector,
    account_id: AccountId,
) -> Result<BalanceReconciliation, LedgerError> {
    let account = unit
        .lock_account(account_id)
        .await?
        .ok_or(AuthorizationError::AccountNotFound(account_id))?;
    let entries = unit.entries_for_account(account_id).await?;

    let mut report = projector.reconcile(&account, &entries);
    if !report.in_sync {
        unit.update_balance(account_id, &report.recomputed).await?;
        report.repaired = true;
        info!(
            recomputed = %report.recomputed,
            cached = %report.cached,
            "Balance repaired from entry history"
        );
    }
    Ok(report)
}

/// Commits on success; rolls back and keeps the original error otherwise
async fn finish<T>(unit: Box<dyn UnitOfWork>, outcome: Result<T, LedgerError>) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            unit.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = unit.rollback().await {
                warn!(error = %rollback_error, "Rollback failed; unit discarded");
            }
            Err(error)
        }
    }
}
