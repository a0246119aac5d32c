use super::ledger::Transaction;
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::RideAPI,
    auth::{Platform, User},
    entities::{Amount, Distance, Event, Ride, RideId, RideSummary},
    error::{invalid_input_error, Error},
};

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn request_ride(
        &self,
        user: User,
        distance: Distance,
        value: Amount,
    ) -> Result<RideId, Error> {
        if distance == 0 || value == 0 {
            tracing::info!("rejecting ride request without distance or fare");
            return Err(invalid_input_error());
        }

        self.authorize(user, "request_ride", Platform::default())?;

        let mut ledger = self.ledger.lock().await;
        let mut tx = ledger.begin();

        let id = tx.next_id()?;
        let ride = Ride::new(id, user.id, distance, value)?;

        // the attached value must be in custody before the ride becomes visible
        self.treasury.escrow(user.id, value).await?;

        tx.update(ride.clone());
        tx.emit(Event::requested(&ride));
        tx.commit();

        tracing::info!(ride_id = id, "ride requested");

        Ok(id)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_ride(&self, user: User, id: RideId) -> Result<(), Error> {
        let mut ledger = self.ledger.lock().await;
        let mut tx = ledger.begin();

        let mut ride = tx.fetch_for_update(id)?;

        self.authorize(user, "accept", ride.clone())?;

        ride.accept(user.id)?;

        tx.update(ride);
        tx.emit(Event::accepted(id, user.id));
        tx.commit();

        tracing::info!(ride_id = id, "ride accepted");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn complete_ride(&self, user: User, id: RideId) -> Result<(), Error> {
        let mut ledger = self.ledger.lock().await;
        let mut tx = ledger.begin();

        let mut ride = tx.fetch_for_update(id)?;

        self.authorize(user, "complete", ride.clone())?;

        let driver = ride.complete()?;
        let fare = ride.fare;

        tx.update(ride);
        tx.emit(Event::completed(id));

        self.settle(tx, driver, fare).await?;

        tracing::info!(ride_id = id, "ride completed, fare released to driver");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_ride(&self, user: User, id: RideId) -> Result<(), Error> {
        let mut ledger = self.ledger.lock().await;
        let mut tx = ledger.begin();

        let mut ride = tx.fetch_for_update(id)?;

        self.authorize(user, "cancel", ride.clone())?;

        let passenger = ride.cancel()?;
        let fare = ride.fare;

        tx.update(ride);
        tx.emit(Event::cancelled(id));

        self.settle(tx, passenger, fare).await?;

        tracing::info!(ride_id = id, "ride cancelled, fare refunded to passenger");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: RideId) -> Result<RideSummary, Error> {
        let ledger = self.ledger.lock().await;

        Ok(ledger.find(id).cloned().into())
    }
}

impl Engine {
    /// Pays `amount` out of custody and commits `tx` only if the payment went
    /// through.
    #[tracing::instrument(skip(self, tx))]
    async fn settle(
        &self,
        tx: Transaction<'_>,
        payee: Uuid,
        amount: Amount,
    ) -> Result<(), Error> {
        match self.treasury.release(payee, amount).await {
            Ok(()) => {
                tx.commit();
                Ok(())
            }
            Err(err) => {
                tracing::warn!("payout failed, discarding staged transition: {}", err);
                tx.rollback();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::api::{AccountAPI, EventAPI, QueryAPI, RideAPI};
    use crate::auth::User;
    use crate::engine::Engine;
    use crate::entities::{Event, RideStatus, RideSummary};
    use crate::treasury::Vault;

    fn engine() -> (Engine, Arc<Vault>) {
        let vault = Arc::new(Vault::new());
        let engine = Engine::new(vault.clone()).unwrap();

        (engine, vault)
    }

    fn user() -> User {
        User::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn request_ride_test() {
        let (engine, _) = engine();
        let passenger = user();

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();
        assert_eq!(id, 1);

        let ride = engine.find_ride(id).await.unwrap();
        assert_eq!(ride.passenger, passenger.id);
        assert!(ride.driver.is_nil());
        assert_eq!(ride.distance, 5);
        assert_eq!(ride.fare, 100);
        assert_eq!(ride.status, RideStatus::Requested);

        assert_eq!(engine.find_available_rides().await.unwrap(), vec![1]);
        assert_eq!(engine.find_custody().await.unwrap(), 100);

        let events = engine.find_events(0).await.unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::RideRequested {
                ride_id,
                passenger: requester,
                driver,
                distance,
                fare,
                ..
            } => {
                assert_eq!(*ride_id, 1);
                assert_eq!(*requester, passenger.id);
                assert_eq!(*driver, None);
                assert_eq!(*distance, 5);
                assert_eq!(*fare, 100);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn request_ride_validation_test() {
        let (engine, _) = engine();
        let passenger = user();

        let err = engine.request_ride(passenger, 0, 100).await.unwrap_err();
        assert!(err.is_invalid_input_error());

        let err = engine.request_ride(passenger, 5, 0).await.unwrap_err();
        assert!(err.is_invalid_input_error());

        let err = engine
            .request_ride(User::new(Uuid::nil()), 5, 100)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized_error());

        // rejected requests take no value and burn no id
        assert_eq!(engine.find_custody().await.unwrap(), 0);
        assert!(engine.find_events(0).await.unwrap().is_empty());
        assert_eq!(engine.request_ride(passenger, 5, 100).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn accept_ride_test() {
        let (engine, _) = engine();
        let passenger = user();
        let first = user();
        let second = user();

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();

        engine.accept_ride(first, id).await.unwrap();

        let ride = engine.find_ride(id).await.unwrap();
        assert_eq!(ride.status, RideStatus::Accepted);
        assert_eq!(ride.driver, first.id);

        let err = engine.accept_ride(second, id).await.unwrap_err();
        assert!(err.is_invalid_state_error());
        assert_eq!(engine.find_ride(id).await.unwrap().driver, first.id);

        assert_eq!(engine.find_user_active_rides(first.id).await.unwrap(), vec![id]);
        assert_eq!(
            engine.find_user_active_rides(passenger.id).await.unwrap(),
            vec![id]
        );
        assert!(engine
            .find_user_active_rides(second.id)
            .await
            .unwrap()
            .is_empty());
        assert!(engine.find_available_rides().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accept_ride_rejections_test() {
        let (engine, _) = engine();
        let passenger = user();

        let err = engine.accept_ride(user(), 42).await.unwrap_err();
        assert!(err.is_not_found_error());

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();

        let err = engine.accept_ride(passenger, id).await.unwrap_err();
        assert!(err.is_unauthorized_error());

        let err = engine
            .accept_ride(User::new(Uuid::nil()), id)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized_error());

        assert_eq!(engine.find_ride(id).await.unwrap().status, RideStatus::Requested);
        assert_eq!(engine.find_events(0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn complete_ride_test() {
        let (engine, _) = engine();
        let passenger = user();
        let driver = user();

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();
        engine.accept_ride(driver, id).await.unwrap();
        engine.complete_ride(driver, id).await.unwrap();

        let ride = engine.find_ride(id).await.unwrap();
        assert_eq!(ride.status, RideStatus::Completed);
        assert_eq!(engine.find_balance(driver.id).await.unwrap(), 100);
        assert_eq!(engine.find_balance(passenger.id).await.unwrap(), 0);
        assert_eq!(engine.find_custody().await.unwrap(), 0);

        assert_eq!(
            engine.find_user_completed_rides(passenger.id).await.unwrap(),
            vec![id]
        );
        assert_eq!(
            engine.find_user_completed_rides(driver.id).await.unwrap(),
            vec![id]
        );
        assert!(engine
            .find_user_active_rides(driver.id)
            .await
            .unwrap()
            .is_empty());

        // a second completion pays nothing
        let err = engine.complete_ride(driver, id).await.unwrap_err();
        assert!(err.is_invalid_state_error());
        assert_eq!(engine.find_balance(driver.id).await.unwrap(), 100);
        assert_eq!(engine.find_events(0).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn complete_ride_rejections_test() {
        let (engine, _) = engine();
        let passenger = user();
        let driver = user();

        let err = engine.complete_ride(driver, 1).await.unwrap_err();
        assert!(err.is_not_found_error());

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();

        // nobody drives the ride yet
        let err = engine.complete_ride(driver, id).await.unwrap_err();
        assert!(err.is_unauthorized_error());

        engine.accept_ride(driver, id).await.unwrap();

        let err = engine.complete_ride(passenger, id).await.unwrap_err();
        assert!(err.is_unauthorized_error());

        let err = engine.complete_ride(user(), id).await.unwrap_err();
        assert!(err.is_unauthorized_error());

        assert_eq!(engine.find_ride(id).await.unwrap().status, RideStatus::Accepted);
        assert_eq!(engine.find_custody().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn failed_payout_rolls_back_completion_test() {
        let (engine, vault) = engine();
        let passenger = user();
        let driver = user();

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();
        engine.accept_ride(driver, id).await.unwrap();

        let receiver = engine.subscribe().await.unwrap();
        vault.refuse_payments(driver.id).await;

        let err = engine.complete_ride(driver, id).await.unwrap_err();
        assert!(err.is_payout_error());

        let ride = engine.find_ride(id).await.unwrap();
        assert_eq!(ride.status, RideStatus::Accepted);
        assert_eq!(engine.find_custody().await.unwrap(), 100);
        assert_eq!(engine.find_balance(driver.id).await.unwrap(), 0);
        assert_eq!(engine.find_events(0).await.unwrap().len(), 2);
        assert!(receiver.try_recv().is_err());

        // the driver can retry once the payout goes through
        vault.accept_payments(driver.id).await;
        engine.complete_ride(driver, id).await.unwrap();

        assert_eq!(engine.find_ride(id).await.unwrap().status, RideStatus::Completed);
        assert_eq!(engine.find_balance(driver.id).await.unwrap(), 100);
        assert_eq!(receiver.try_recv().unwrap().ride_id(), id);
    }

    #[tokio::test]
    async fn cancel_ride_test() {
        let (engine, _) = engine();
        let passenger = user();

        let first = engine.request_ride(passenger, 5, 100).await.unwrap();
        let id = engine.request_ride(passenger, 8, 50).await.unwrap();
        assert_eq!(id, 2);

        engine.cancel_ride(passenger, id).await.unwrap();

        assert_eq!(engine.find_ride(id).await.unwrap().status, RideStatus::Cancelled);
        assert_eq!(engine.find_balance(passenger.id).await.unwrap(), 50);
        assert_eq!(engine.find_custody().await.unwrap(), 100);
        assert_eq!(engine.find_available_rides().await.unwrap(), vec![first]);

        let err = engine.cancel_ride(passenger, id).await.unwrap_err();
        assert!(err.is_invalid_state_error());

        let err = engine.accept_ride(user(), id).await.unwrap_err();
        assert!(err.is_invalid_state_error());

        assert_eq!(engine.find_balance(passenger.id).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn cancel_ride_rejections_test() {
        let (engine, _) = engine();
        let passenger = user();
        let driver = user();

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();

        let err = engine.cancel_ride(driver, id).await.unwrap_err();
        assert!(err.is_unauthorized_error());

        engine.accept_ride(driver, id).await.unwrap();

        let err = engine.cancel_ride(passenger, id).await.unwrap_err();
        assert!(err.is_invalid_state_error());

        let err = engine.cancel_ride(passenger, 99).await.unwrap_err();
        assert!(err.is_not_found_error());

        assert_eq!(engine.find_ride(id).await.unwrap().status, RideStatus::Accepted);
        assert_eq!(engine.find_custody().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn failed_refund_rolls_back_cancellation_test() {
        let (engine, vault) = engine();
        let passenger = user();

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();
        vault.refuse_payments(passenger.id).await;

        let err = engine.cancel_ride(passenger, id).await.unwrap_err();
        assert!(err.is_payout_error());

        assert_eq!(engine.find_ride(id).await.unwrap().status, RideStatus::Requested);
        assert_eq!(engine.find_available_rides().await.unwrap(), vec![id]);
        assert_eq!(engine.find_custody().await.unwrap(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_accept_test() {
        let (engine, _) = engine();
        let engine = Arc::new(engine);
        let passenger = user();

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.accept_ride(user(), id).await }
        });
        let second = tokio::spawn({
            let engine = engine.clone();
            async move { engine.accept_ride(user(), id).await }
        });

        let results = vec![first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|err| err.is_invalid_state_error()));
    }

    #[tokio::test]
    async fn missing_ride_is_zero_valued_test() {
        let (engine, _) = engine();

        let ride = engine.find_ride(1).await.unwrap();
        assert_eq!(ride, RideSummary::default());
        assert!(!ride.exists());

        engine.request_ride(user(), 5, 100).await.unwrap();
        assert!(engine.find_ride(1).await.unwrap().exists());
        assert!(!engine.find_ride(2).await.unwrap().exists());
    }

    #[tokio::test]
    async fn fare_conservation_test() {
        let (engine, _) = engine();
        let passenger = user();
        let driver = user();

        let completed = engine.request_ride(passenger, 5, 100).await.unwrap();
        let cancelled = engine.request_ride(passenger, 3, 40).await.unwrap();
        let pending = engine.request_ride(passenger, 2, 25).await.unwrap();
        assert_eq!(engine.find_custody().await.unwrap(), 165);

        engine.accept_ride(driver, completed).await.unwrap();
        engine.complete_ride(driver, completed).await.unwrap();
        engine.cancel_ride(passenger, cancelled).await.unwrap();

        assert_eq!(engine.find_balance(driver.id).await.unwrap(), 100);
        assert_eq!(engine.find_balance(passenger.id).await.unwrap(), 40);
        assert_eq!(engine.find_custody().await.unwrap(), 25);

        engine.cancel_ride(passenger, pending).await.unwrap();
        assert_eq!(engine.find_custody().await.unwrap(), 0);
        assert_eq!(engine.find_balance(passenger.id).await.unwrap(), 65);
    }

    #[tokio::test]
    async fn marketplace_walkthrough_test() {
        let (engine, _) = engine();
        let passenger = user();
        let d1 = user();
        let d2 = user();

        let id = engine.request_ride(passenger, 5, 100).await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(engine.find_available_rides().await.unwrap(), vec![1]);

        engine.accept_ride(d1, 1).await.unwrap();
        let err = engine.accept_ride(d2, 1).await.unwrap_err();
        assert!(err.is_invalid_state_error());
        assert_eq!(engine.find_user_active_rides(d1.id).await.unwrap(), vec![1]);

        engine.complete_ride(d1, 1).await.unwrap();
        assert_eq!(engine.find_balance(d1.id).await.unwrap(), 100);
        assert_eq!(
            engine.find_user_completed_rides(passenger.id).await.unwrap(),
            vec![1]
        );
        let err = engine.complete_ride(d1, 1).await.unwrap_err();
        assert!(err.is_invalid_state_error());

        let id = engine.request_ride(passenger, 5, 50).await.unwrap();
        assert_eq!(id, 2);
        engine.cancel_ride(passenger, 2).await.unwrap();
        assert_eq!(engine.find_balance(passenger.id).await.unwrap(), 50);
        assert!(engine.find_available_rides().await.unwrap().is_empty());

        let id = engine.request_ride(passenger, 5, 10).await.unwrap();
        assert_eq!(id, 3);
        let err = engine.cancel_ride(d1, 3).await.unwrap_err();
        assert!(err.is_unauthorized_error());

        let names: Vec<String> = engine
            .find_events(0)
            .await
            .unwrap()
            .iter()
            .map(|event| event.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "ride_requested",
                "ride_accepted",
                "ride_completed",
                "ride_requested",
                "ride_cancelled",
                "ride_requested",
            ]
        );
    }
}
