use super::Engine;

use async_channel::Receiver;
use async_trait::async_trait;

use crate::{api::EventAPI, entities::Event, error::Error};

#[async_trait]
impl EventAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_events(&self, since: usize) -> Result<Vec<Event>, Error> {
        let ledger = self.ledger.lock().await;

        Ok(ledger.events_since(since))
    }

    #[tracing::instrument(skip(self))]
    async fn subscribe(&self) -> Result<Receiver<Event>, Error> {
        let mut ledger = self.ledger.lock().await;

        tracing::info!("new notification subscriber");

        Ok(ledger.subscribe())
    }
}

#[test]
fn journal_replay_test() {
    use std::sync::Arc;
    use tokio_test::block_on;
    use uuid::Uuid;

    use crate::api::RideAPI;
    use crate::auth::User;
    use crate::treasury::Vault;

    let engine = Engine::new(Arc::new(Vault::new())).unwrap();
    let passenger = User::new(Uuid::new_v4());
    let driver = User::new(Uuid::new_v4());

    block_on(engine.request_ride(passenger, 5, 100)).unwrap();
    let receiver = block_on(engine.subscribe()).unwrap();
    block_on(engine.accept_ride(driver, 1)).unwrap();

    let events = block_on(engine.find_events(1)).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "ride_accepted");

    // subscribers only see what happened after they subscribed
    let live = block_on(receiver.recv()).unwrap();
    assert_eq!(live, events[0]);
    assert!(receiver.try_recv().is_err());

    assert!(block_on(engine.find_events(5)).unwrap().is_empty());
}
