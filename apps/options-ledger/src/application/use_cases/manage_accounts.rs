//! Manage Accounts Use Case

use std::sync::Arc;

use crate::application::dto::{CashFlowDto, CreateAccountDto};
use crate::application::ports::{ChangeSet, LedgerStore};
use crate::config::LedgerConfig;
use crate::domain::accounts::{Account, CashFlow};
use crate::domain::shared::{AccountId, Money, UserId};
use crate::error::LedgerError;

use super::support::{log_failure, owned_account};

/// Use case for accounts and their cash movements.
pub struct ManageAccountsUseCase<S>
where
    S: LedgerStore,
{
    store: Arc<S>,
    defaults: LedgerConfig,
}

impl<S> ManageAccountsUseCase<S>
where
    S: LedgerStore,
{
    /// Create a new `ManageAccountsUseCase` with the configured fee defaults.
    pub const fn new(store: Arc<S>, defaults: LedgerConfig) -> Self {
        Self { store, defaults }
    }

    /// Open an account owned by the actor.
    ///
    /// Fees not given fall back to the configured ledger defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or a fee or balance is negative.
    pub async fn create_account(
        &self,
        actor: &UserId,
        request: CreateAccountDto,
    ) -> Result<Account, LedgerError> {
        let result = self.create(actor, request).await;
        if let Err(e) = &result {
            log_failure("create_account", e);
        }
        result
    }

    async fn create(&self, actor: &UserId, request: CreateAccountDto) -> Result<Account, LedgerError> {
        let account = Account::new(
            AccountId::generate(),
            actor.clone(),
            request.name,
            Money::new(request.initial_balance),
        )?
        .with_fees(
            request.default_fee.unwrap_or(self.defaults.default_fee),
            Money::new(
                request
                    .assignment_fee
                    .unwrap_or(self.defaults.assignment_fee),
            ),
        )?;

        let mut changes = ChangeSet::new();
        changes.put_account(account.clone());
        self.store.commit(changes).await?;
        tracing::info!(account_id = %account.id(), owner = %actor, "Account opened");
        Ok(account)
    }

    /// Record a deposit or withdrawal.
    ///
    /// # Errors
    ///
    /// Returns error if the account is missing or not owned by the actor, or
    /// if the amount is not positive.
    pub async fn record_cash_flow(
        &self,
        actor: &UserId,
        account_id: &AccountId,
        request: CashFlowDto,
    ) -> Result<Account, LedgerError> {
        let result = self.cash_flow(actor, account_id, request).await;
        if let Err(e) = &result {
            log_failure("record_cash_flow", e);
        }
        result
    }

    async fn cash_flow(
        &self,
        actor: &UserId,
        account_id: &AccountId,
        request: CashFlowDto,
    ) -> Result<Account, LedgerError> {
        let mut account = owned_account(self.store.as_ref(), actor, account_id).await?;
        let flow = CashFlow {
            kind: request.kind,
            amount: Money::new(request.amount),
            date: request.date,
            notes: request.notes,
        };
        let signed = flow.signed();
        account.record_cash_flow(flow)?;

        let mut changes = ChangeSet::new();
        changes.put_account(account.clone());
        self.store.commit(changes).await?;
        tracing::info!(
            account_id = %account_id,
            amount = %signed,
            capital = %account.contributed_capital(),
            "Cash flow recorded"
        );
        Ok(account)
    }

    /// Accounts the actor owns, by name.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn list_accounts(&self, actor: &UserId) -> Result<Vec<Account>, LedgerError> {
        let mut accounts = self.store.find_accounts_by_owner(actor).await?;
        accounts.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::test_support::{Fixture, day};
    use crate::domain::accounts::CashFlowKind;
    use crate::error::ErrorCode;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn request(name: &str) -> CreateAccountDto {
        CreateAccountDto {
            name: name.to_string(),
            initial_balance: dec!(5000),
            default_fee: None,
            assignment_fee: None,
        }
    }

    #[tokio::test]
    async fn configured_fees_fill_gaps() {
        let fx = Fixture::new().await;
        let uc = ManageAccountsUseCase::new(
            Arc::clone(&fx.store),
            LedgerConfig {
                default_fee: dec!(0.5),
                assignment_fee: dec!(10),
            },
        );
        let account = uc
            .create_account(
                &fx.alice,
                CreateAccountDto {
                    default_fee: Some(dec!(0.65)),
                    ..request("Roth")
                },
            )
            .await
            .unwrap();
        assert_eq!(account.default_fee(), dec!(0.65));
        assert_eq!(account.assignment_fee(), Money::new(dec!(10)));
        assert!(account.is_owned_by(&fx.alice));
    }

    #[tokio::test]
    async fn listing_is_per_owner() {
        let fx = Fixture::new().await;
        let uc = fx.accounts();
        uc.create_account(&fx.alice, request("Brokerage")).await.unwrap();
        uc.create_account(&UserId::new("bob"), request("Bob's")).await.unwrap();

        let names: Vec<String> = uc
            .list_accounts(&fx.alice)
            .await
            .unwrap()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec!["Brokerage", "Main"]);
    }

    #[tokio::test]
    async fn cash_flows_move_capital() {
        let fx = Fixture::new().await;
        let uc = fx.accounts();
        let acct = AccountId::new("acct");
        let flow = |kind, amount: Decimal| CashFlowDto {
            kind,
            amount,
            date: day(5),
            notes: None,
        };
        uc.record_cash_flow(&fx.alice, &acct, flow(CashFlowKind::Deposit, dec!(2500)))
            .await
            .unwrap();
        let account = uc
            .record_cash_flow(&fx.alice, &acct, flow(CashFlowKind::Withdrawal, dec!(500)))
            .await
            .unwrap();
        assert_eq!(account.contributed_capital(), Money::new(dec!(12000)));

        let err = uc
            .record_cash_flow(&fx.alice, &acct, flow(CashFlowKind::Deposit, dec!(0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);

        let err = uc
            .record_cash_flow(
                &UserId::new("mallory"),
                &acct,
                flow(CashFlowKind::Withdrawal, dec!(1)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
