use async_channel::Receiver;
use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Amount, Distance, Event, Message, RideId, RideSummary};
use crate::error::Error;

#[async_trait]
pub trait RideAPI {
    async fn request_ride(
        &self,
        user: User,
        distance: Distance,
        value: Amount,
    ) -> Result<RideId, Error>;
    async fn accept_ride(&self, user: User, id: RideId) -> Result<(), Error>;
    async fn complete_ride(&self, user: User, id: RideId) -> Result<(), Error>;
    async fn cancel_ride(&self, user: User, id: RideId) -> Result<(), Error>;
    async fn find_ride(&self, id: RideId) -> Result<RideSummary, Error>;
}

#[async_trait]
pub trait QueryAPI {
    async fn find_available_rides(&self) -> Result<Vec<RideId>, Error>;
    async fn find_user_active_rides(&self, user_id: Uuid) -> Result<Vec<RideId>, Error>;
    async fn find_user_completed_rides(&self, user_id: Uuid) -> Result<Vec<RideId>, Error>;
}

#[async_trait]
pub trait EventAPI {
    async fn find_events(&self, since: usize) -> Result<Vec<Event>, Error>;
    async fn subscribe(&self) -> Result<Receiver<Event>, Error>;
}

#[async_trait]
pub trait AccountAPI {
    async fn find_balance(&self, user_id: Uuid) -> Result<Amount, Error>;
    async fn find_custody(&self) -> Result<Amount, Error>;
}

#[async_trait]
pub trait MessageAPI {
    async fn send_message(&self, user: User, id: RideId, text: String) -> Result<(), Error>;
    async fn find_messages(&self, user: User, id: RideId) -> Result<Vec<Message>, Error>;
}

pub trait API: RideAPI + QueryAPI + EventAPI + AccountAPI + MessageAPI {}
