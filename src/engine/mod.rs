mod account_api;
mod event_api;
pub mod ledger;
mod message_api;
mod query_api;
mod ride_api;

use oso::Oso;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    api::API,
    auth::authorizor,
    error::{unauthorized_error, Error},
    treasury::Treasury,
};

use ledger::Ledger;

pub type DynTreasury = Arc<dyn Treasury + Send + Sync>;

pub struct Engine {
    ledger: Mutex<Ledger>,
    treasury: DynTreasury,
    authorizor: Oso,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(treasury: DynTreasury) -> Result<Self, Error> {
        Ok(Self {
            ledger: Mutex::new(Ledger::new()),
            treasury,
            authorizor: authorizor::new()?,
        })
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(unauthorized_error())
    }
}

impl API for Engine {}
