use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{api::AccountAPI, entities::Amount, error::Error};

#[async_trait]
impl AccountAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_balance(&self, user_id: Uuid) -> Result<Amount, Error> {
        self.treasury.balance_of(user_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_custody(&self) -> Result<Amount, Error> {
        self.treasury.custody().await
    }
}
