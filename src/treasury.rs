use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entities::Amount;
use crate::error::{invalid_input_error, payout_error, unexpected_error, Error};

/// Custody of escrowed fares.
///
/// `escrow` takes a caller's attached value into custody; `release` pays
/// custodied value out to a recipient. A failed `release` must leave custody
/// untouched so the caller can discard the transition that triggered it.
#[async_trait]
pub trait Treasury {
    async fn escrow(&self, payer: Uuid, amount: Amount) -> Result<(), Error>;
    async fn release(&self, payee: Uuid, amount: Amount) -> Result<(), Error>;
    async fn balance_of(&self, account: Uuid) -> Result<Amount, Error>;
    async fn custody(&self) -> Result<Amount, Error>;
}

#[derive(Debug, Default)]
struct VaultState {
    custody: Amount,
    balances: HashMap<Uuid, Amount>,
    refused: HashSet<Uuid>,
}

/// In-memory treasury: a custody total plus the balances credited to each
/// recipient.
#[derive(Debug, Default)]
pub struct Vault {
    state: Mutex<VaultState>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vault whose payouts to `accounts` always fail.
    pub fn with_refused_accounts<I: IntoIterator<Item = Uuid>>(accounts: I) -> Self {
        Self {
            state: Mutex::new(VaultState {
                refused: accounts.into_iter().collect(),
                ..VaultState::default()
            }),
        }
    }

    pub async fn refuse_payments(&self, account: Uuid) {
        self.state.lock().await.refused.insert(account);
    }

    pub async fn accept_payments(&self, account: Uuid) {
        self.state.lock().await.refused.remove(&account);
    }
}

#[async_trait]
impl Treasury for Vault {
    #[tracing::instrument(skip(self))]
    async fn escrow(&self, payer: Uuid, amount: Amount) -> Result<(), Error> {
        if amount == 0 {
            return Err(invalid_input_error());
        }

        let mut state = self.state.lock().await;

        state.custody = state
            .custody
            .checked_add(amount)
            .ok_or_else(invalid_input_error)?;

        tracing::info!(%payer, custody = state.custody, "value taken into custody");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn release(&self, payee: Uuid, amount: Amount) -> Result<(), Error> {
        let mut state = self.state.lock().await;

        if state.refused.contains(&payee) {
            tracing::warn!("payee refused the payment");
            return Err(payout_error());
        }

        if state.custody < amount {
            tracing::error!(custody = state.custody, "release exceeds custodied value");
            return Err(unexpected_error());
        }

        let balance = state.balances.get(&payee).copied().unwrap_or(0);
        let balance = balance.checked_add(amount).ok_or_else(payout_error)?;

        state.custody -= amount;
        state.balances.insert(payee, balance);

        Ok(())
    }

    async fn balance_of(&self, account: Uuid) -> Result<Amount, Error> {
        let state = self.state.lock().await;

        Ok(state.balances.get(&account).copied().unwrap_or(0))
    }

    async fn custody(&self) -> Result<Amount, Error> {
        Ok(self.state.lock().await.custody)
    }
}

#[test]
fn vault_escrow_and_release_test() {
    use tokio_test::block_on;

    let vault = Vault::new();
    let passenger = Uuid::new_v4();
    let driver = Uuid::new_v4();

    block_on(vault.escrow(passenger, 100)).unwrap();
    block_on(vault.escrow(passenger, 50)).unwrap();
    assert_eq!(block_on(vault.custody()).unwrap(), 150);

    block_on(vault.release(driver, 100)).unwrap();
    assert_eq!(block_on(vault.custody()).unwrap(), 50);
    assert_eq!(block_on(vault.balance_of(driver)).unwrap(), 100);
    assert_eq!(block_on(vault.balance_of(passenger)).unwrap(), 0);

    // never pays out more than it holds
    let err = block_on(vault.release(driver, 51)).unwrap_err();
    assert!(err.is_internal());
    assert_eq!(block_on(vault.custody()).unwrap(), 50);
}

#[test]
fn vault_rejects_empty_escrow_test() {
    use tokio_test::block_on;

    let vault = Vault::new();

    let err = block_on(vault.escrow(Uuid::new_v4(), 0)).unwrap_err();
    assert!(err.is_invalid_input_error());
    assert_eq!(block_on(vault.custody()).unwrap(), 0);
}

#[test]
fn vault_refused_payee_test() {
    use tokio_test::block_on;

    let driver = Uuid::new_v4();
    let vault = Vault::with_refused_accounts([driver]);

    block_on(vault.escrow(Uuid::new_v4(), 100)).unwrap();

    let err = block_on(vault.release(driver, 100)).unwrap_err();
    assert!(err.is_payout_error());
    assert_eq!(block_on(vault.custody()).unwrap(), 100);
    assert_eq!(block_on(vault.balance_of(driver)).unwrap(), 0);

    block_on(vault.accept_payments(driver));
    block_on(vault.release(driver, 100)).unwrap();
    assert_eq!(block_on(vault.custody()).unwrap(), 0);
    assert_eq!(block_on(vault.balance_of(driver)).unwrap(), 100);
}
