use super::Engine;

use async_trait::async_trait;

use crate::{
    api::MessageAPI,
    auth::User,
    entities::{Message, RideId},
    error::{invalid_state_error, not_found_error, Error},
};

#[async_trait]
impl MessageAPI for Engine {
    #[tracing::instrument(skip(self, text))]
    async fn send_message(&self, user: User, id: RideId, text: String) -> Result<(), Error> {
        let mut ledger = self.ledger.lock().await;
        let mut tx = ledger.begin();

        let ride = tx.fetch_for_update(id)?;

        self.authorize(user, "message", ride.clone())?;

        if !ride.is_active_for(&user.id) {
            return Err(invalid_state_error());
        }

        tx.post(id, Message::new(user.id, &text)?);
        tx.commit();

        tracing::info!(ride_id = id, "message sent");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_messages(&self, user: User, id: RideId) -> Result<Vec<Message>, Error> {
        let ledger = self.ledger.lock().await;

        let ride = ledger.find(id).cloned().ok_or_else(not_found_error)?;

        self.authorize(user, "message", ride)?;

        Ok(ledger.messages(id))
    }
}
