use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Amount, Distance, Ride, RideId};

/// Notification appended to the journal for every committed mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Event {
    RideRequested {
        ride_id: RideId,
        passenger: Uuid,
        driver: Option<Uuid>,
        distance: Distance,
        fare: Amount,
        timestamp: DateTime<Utc>,
    },
    RideAccepted {
        ride_id: RideId,
        driver: Uuid,
        timestamp: DateTime<Utc>,
    },
    RideCompleted {
        ride_id: RideId,
        timestamp: DateTime<Utc>,
    },
    RideCancelled {
        ride_id: RideId,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn requested(ride: &Ride) -> Self {
        Self::RideRequested {
            ride_id: ride.id,
            passenger: ride.passenger,
            driver: ride.driver,
            distance: ride.distance,
            fare: ride.fare,
            timestamp: ride.requested_at,
        }
    }

    pub fn accepted(ride_id: RideId, driver: Uuid) -> Self {
        Self::RideAccepted {
            ride_id,
            driver,
            timestamp: Utc::now(),
        }
    }

    pub fn completed(ride_id: RideId) -> Self {
        Self::RideCompleted {
            ride_id,
            timestamp: Utc::now(),
        }
    }

    pub fn cancelled(ride_id: RideId) -> Self {
        Self::RideCancelled {
            ride_id,
            timestamp: Utc::now(),
        }
    }

    pub fn ride_id(&self) -> RideId {
        match self {
            Self::RideRequested { ride_id, .. }
            | Self::RideAccepted { ride_id, .. }
            | Self::RideCompleted { ride_id, .. }
            | Self::RideCancelled { ride_id, .. } => *ride_id,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::RideRequested { .. } => "ride_requested".into(),
            Self::RideAccepted { .. } => "ride_accepted".into(),
            Self::RideCompleted { .. } => "ride_completed".into(),
            Self::RideCancelled { .. } => "ride_cancelled".into(),
        }
    }
}

#[test]
fn event_wire_format_test() {
    let passenger = Uuid::new_v4();
    let ride = Ride::new(3, passenger, 5, 100).unwrap();

    let value = serde_json::to_value(Event::requested(&ride)).unwrap();
    assert_eq!(value["name"], "ride_requested");
    assert_eq!(value["ride_id"], 3);
    assert_eq!(value["passenger"], passenger.to_string());
    assert!(value["driver"].is_null());
    assert_eq!(value["distance"], 5);
    assert_eq!(value["fare"], 100);
    assert_eq!(
        value["timestamp"],
        serde_json::to_value(ride.requested_at).unwrap()
    );

    let event = Event::cancelled(3);
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["name"], event.name());
    assert!(value["timestamp"].is_string());
    assert_eq!(event.ride_id(), 3);
}
