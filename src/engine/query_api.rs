use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::QueryAPI,
    entities::{Ride, RideId},
    error::Error,
};

// Queries walk every ride ever issued, in ascending id order.
impl Engine {
    async fn scan<F>(&self, predicate: F) -> Vec<RideId>
    where
        F: Fn(&Ride) -> bool + Send,
    {
        let ledger = self.ledger.lock().await;

        ledger
            .rides()
            .filter(|ride| predicate(*ride))
            .map(|ride| ride.id)
            .collect()
    }
}

#[async_trait]
impl QueryAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_available_rides(&self) -> Result<Vec<RideId>, Error> {
        Ok(self.scan(Ride::is_available).await)
    }

    #[tracing::instrument(skip(self))]
    async fn find_user_active_rides(&self, user_id: Uuid) -> Result<Vec<RideId>, Error> {
        Ok(self.scan(|ride| ride.is_active_for(&user_id)).await)
    }

    #[tracing::instrument(skip(self))]
    async fn find_user_completed_rides(&self, user_id: Uuid) -> Result<Vec<RideId>, Error> {
        Ok(self.scan(|ride| ride.is_completed_for(&user_id)).await)
    }
}

#[test]
fn queries_are_ordered_and_filtered_test() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use crate::api::RideAPI;
    use crate::auth::User;
    use crate::treasury::Vault;

    let engine = Engine::new(Arc::new(Vault::new())).unwrap();

    let alice = User::new(Uuid::new_v4());
    let bob = User::new(Uuid::new_v4());
    let driver = User::new(Uuid::new_v4());

    for _ in 0..3 {
        block_on(engine.request_ride(alice, 5, 10)).unwrap();
        block_on(engine.request_ride(bob, 7, 20)).unwrap();
    }

    // alice: 1, 3, 5; bob: 2, 4, 6
    block_on(engine.accept_ride(driver, 5)).unwrap();
    block_on(engine.accept_ride(driver, 2)).unwrap();
    block_on(engine.accept_ride(driver, 3)).unwrap();
    block_on(engine.complete_ride(driver, 3)).unwrap();
    block_on(engine.cancel_ride(bob, 6)).unwrap();

    assert_eq!(block_on(engine.find_available_rides()).unwrap(), vec![1, 4]);

    assert_eq!(
        block_on(engine.find_user_active_rides(driver.id)).unwrap(),
        vec![2, 5]
    );
    assert_eq!(
        block_on(engine.find_user_active_rides(alice.id)).unwrap(),
        vec![5]
    );
    assert_eq!(
        block_on(engine.find_user_active_rides(bob.id)).unwrap(),
        vec![2]
    );

    assert_eq!(
        block_on(engine.find_user_completed_rides(alice.id)).unwrap(),
        vec![3]
    );
    assert_eq!(
        block_on(engine.find_user_completed_rides(driver.id)).unwrap(),
        vec![3]
    );
    // cancelled rides are neither active nor completed
    assert!(block_on(engine.find_user_completed_rides(bob.id))
        .unwrap()
        .is_empty());
}
