use async_channel::{Receiver, Sender};
use std::collections::BTreeMap;

use crate::entities::{Event, Message, Ride, RideId};
use crate::error::{not_found_error, unexpected_error, Error};

/// Notifications buffered per subscriber. A subscriber that falls this far
/// behind is disconnected.
pub const SUBSCRIBER_CAPACITY: usize = 256;

/// Ride records, the id counter, per-ride messages and the notification
/// journal. Only ever mutated through a committed [`Transaction`].
#[derive(Default)]
pub struct Ledger {
    counter: RideId,
    rides: BTreeMap<RideId, Ride>,
    messages: BTreeMap<RideId, Vec<Message>>,
    journal: Vec<Event>,
    subscribers: Vec<Sender<Event>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Transaction<'_> {
        Transaction {
            counter: self.counter,
            ledger: self,
            writes: BTreeMap::new(),
            messages: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn counter(&self) -> RideId {
        self.counter
    }

    pub fn find(&self, id: RideId) -> Option<&Ride> {
        self.rides.get(&id)
    }

    /// All rides in ascending id order.
    pub fn rides(&self) -> impl Iterator<Item = &Ride> {
        self.rides.values()
    }

    /// Messages exchanged on a ride, oldest first.
    pub fn messages(&self, id: RideId) -> Vec<Message> {
        self.messages.get(&id).cloned().unwrap_or_default()
    }

    pub fn events_since(&self, since: usize) -> Vec<Event> {
        self.journal.iter().skip(since).cloned().collect()
    }

    pub fn subscribe(&mut self) -> Receiver<Event> {
        let (tx, rx) = async_channel::bounded(SUBSCRIBER_CAPACITY);
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: Event) {
        self.subscribers
            .retain(|subscriber| subscriber.try_send(event.clone()).is_ok());
        self.journal.push(event);
    }
}

/// Writes staged against a locked [`Ledger`]. Nothing is visible until
/// `commit`; dropping the transaction discards every staged write and event.
pub struct Transaction<'a> {
    ledger: &'a mut Ledger,
    counter: RideId,
    writes: BTreeMap<RideId, Ride>,
    messages: Vec<(RideId, Message)>,
    events: Vec<Event>,
}

impl<'a> Transaction<'a> {
    pub fn next_id(&mut self) -> Result<RideId, Error> {
        self.counter = self.counter.checked_add(1).ok_or_else(unexpected_error)?;

        Ok(self.counter)
    }

    pub fn fetch_for_update(&self, id: RideId) -> Result<Ride, Error> {
        self.writes
            .get(&id)
            .or_else(|| self.ledger.rides.get(&id))
            .cloned()
            .ok_or_else(not_found_error)
    }

    pub fn update(&mut self, ride: Ride) {
        self.writes.insert(ride.id, ride);
    }

    pub fn post(&mut self, id: RideId, message: Message) {
        self.messages.push((id, message));
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    #[tracing::instrument(skip(self))]
    pub fn commit(self) {
        let Transaction {
            ledger,
            counter,
            writes,
            messages,
            events,
        } = self;

        ledger.counter = counter;
        ledger.rides.extend(writes);

        for (id, message) in messages {
            ledger.messages.entry(id).or_default().push(message);
        }

        for event in events {
            ledger.publish(event);
        }

        tracing::info!("transaction committed");
    }

    #[tracing::instrument(skip(self))]
    pub fn rollback(self) {
        tracing::info!(
            writes = self.writes.len(),
            messages = self.messages.len(),
            events = self.events.len(),
            "transaction rolled back"
        );
    }
}

#[test]
fn transaction_commit_test() {
    use uuid::Uuid;

    let mut ledger = Ledger::new();
    let receiver = ledger.subscribe();

    let mut tx = ledger.begin();
    let id = tx.next_id().unwrap();
    let ride = Ride::new(id, Uuid::new_v4(), 5, 100).unwrap();
    tx.update(ride.clone());
    tx.emit(Event::requested(&ride));

    // staged writes are visible inside the transaction
    assert_eq!(tx.fetch_for_update(id).unwrap().fare, 100);

    tx.commit();

    assert_eq!(ledger.counter(), 1);
    assert!(ledger.find(1).is_some());
    assert_eq!(ledger.events_since(0), vec![Event::requested(&ride)]);
    assert_eq!(receiver.try_recv().unwrap(), Event::requested(&ride));
}

#[test]
fn transaction_rollback_test() {
    use uuid::Uuid;

    let mut ledger = Ledger::new();
    let receiver = ledger.subscribe();

    let mut tx = ledger.begin();
    let id = tx.next_id().unwrap();
    let ride = Ride::new(id, Uuid::new_v4(), 5, 100).unwrap();
    tx.update(ride.clone());
    tx.emit(Event::requested(&ride));
    tx.rollback();

    assert_eq!(ledger.counter(), 0);
    assert!(ledger.find(1).is_none());
    assert!(ledger.events_since(0).is_empty());
    assert!(receiver.try_recv().is_err());

    // a dropped transaction leaves nothing behind either
    {
        let mut tx = ledger.begin();
        tx.next_id().unwrap();
    }
    assert_eq!(ledger.counter(), 0);
}

#[test]
fn fetch_missing_ride_test() {
    let mut ledger = Ledger::new();
    let tx = ledger.begin();

    assert!(tx.fetch_for_update(1).unwrap_err().is_not_found_error());
}

#[test]
fn closed_subscribers_are_dropped_test() {
    use uuid::Uuid;

    let mut ledger = Ledger::new();
    let kept = ledger.subscribe();
    drop(ledger.subscribe());

    let ride = Ride::new(1, Uuid::new_v4(), 5, 100).unwrap();
    let mut tx = ledger.begin();
    tx.next_id().unwrap();
    tx.update(ride.clone());
    tx.emit(Event::requested(&ride));
    tx.commit();

    assert_eq!(ledger.subscribers.len(), 1);
    assert_eq!(kept.try_recv().unwrap().ride_id(), 1);
}

#[test]
fn lagging_subscribers_are_dropped_test() {
    use uuid::Uuid;

    let mut ledger = Ledger::new();
    let stalled = ledger.subscribe();

    for _ in 0..=SUBSCRIBER_CAPACITY {
        let mut tx = ledger.begin();
        let id = tx.next_id().unwrap();
        let ride = Ride::new(id, Uuid::new_v4(), 5, 100).unwrap();
        tx.update(ride.clone());
        tx.emit(Event::requested(&ride));
        tx.commit();
    }

    // the journal keeps everything, the stalled subscriber only what fit
    assert!(ledger.subscribers.is_empty());
    assert_eq!(ledger.events_since(0).len(), SUBSCRIBER_CAPACITY + 1);
    assert_eq!(stalled.len(), SUBSCRIBER_CAPACITY);
}

#[test]
fn messages_commit_with_transaction_test() {
    use uuid::Uuid;

    let mut ledger = Ledger::new();
    let sender = Uuid::new_v4();

    let mut tx = ledger.begin();
    tx.post(1, Message::new(sender, "discarded").unwrap());
    tx.rollback();
    assert!(ledger.messages(1).is_empty());

    let mut tx = ledger.begin();
    tx.post(1, Message::new(sender, "first").unwrap());
    tx.post(1, Message::new(sender, "second").unwrap());
    tx.commit();

    let texts: Vec<String> = ledger.messages(1).into_iter().map(|m| m.text).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert!(ledger.messages(2).is_empty());
}
