use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_input_error, invalid_state_error, Error};

pub type RideId = u64;

/// Smallest indivisible unit of the fare currency.
pub type Amount = u64;

/// Distance in metres.
pub type Distance = u64;

#[derive(Clone, Debug, PolarClass)]
pub struct Ride {
    pub id: RideId,
    #[polar(attribute)]
    pub passenger: Uuid,
    #[polar(attribute)]
    pub driver: Option<Uuid>,
    pub distance: Distance,
    pub fare: Amount,
    pub status: Status,
    pub completed: bool,
    pub requested_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Requested,
    Accepted,
    Completed,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Requested => "requested".into(),
            Self::Accepted => "accepted".into(),
            Self::Completed => "completed".into(),
            Self::Cancelled => "cancelled".into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Ride {
    pub fn new(
        id: RideId,
        passenger: Uuid,
        distance: Distance,
        fare: Amount,
    ) -> Result<Self, Error> {
        if distance == 0 || fare == 0 {
            return Err(invalid_input_error());
        }

        Ok(Self {
            id,
            passenger,
            driver: None,
            distance,
            fare,
            status: Status::Requested,
            completed: false,
            requested_at: Utc::now(),
        })
    }

    pub fn is_available(&self) -> bool {
        self.status == Status::Requested
    }

    pub fn involves(&self, user_id: &Uuid) -> bool {
        self.passenger == *user_id || self.driver.as_ref() == Some(user_id)
    }

    pub fn is_active_for(&self, user_id: &Uuid) -> bool {
        self.status == Status::Accepted && self.involves(user_id)
    }

    pub fn is_completed_for(&self, user_id: &Uuid) -> bool {
        self.status == Status::Completed && self.involves(user_id)
    }

    #[tracing::instrument]
    pub fn accept(&mut self, driver: Uuid) -> Result<(), Error> {
        match (self.status, self.driver) {
            (Status::Requested, None) => {
                self.driver = Some(driver);
                self.status = Status::Accepted;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    /// Moves the ride to `Completed` and returns the driver owed the fare.
    #[tracing::instrument]
    pub fn complete(&mut self) -> Result<Uuid, Error> {
        if self.completed {
            return Err(invalid_state_error());
        }

        match (self.status, self.driver) {
            (Status::Accepted, Some(driver)) => {
                self.completed = true;
                self.status = Status::Completed;
                Ok(driver)
            }
            _ => Err(invalid_state_error()),
        }
    }

    /// Moves the ride to `Cancelled` and returns the passenger owed the refund.
    #[tracing::instrument]
    pub fn cancel(&mut self) -> Result<Uuid, Error> {
        match self.status {
            Status::Requested => {
                self.status = Status::Cancelled;
                Ok(self.passenger)
            }
            _ => Err(invalid_state_error()),
        }
    }
}

/// External view of a ride. Unknown ids are reported as the all-zero default,
/// recognisable by its nil passenger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideSummary {
    pub passenger: Uuid,
    pub driver: Uuid,
    pub distance: Distance,
    pub status: Status,
    pub fare: Amount,
}

impl RideSummary {
    pub fn exists(&self) -> bool {
        !self.passenger.is_nil()
    }
}

impl From<Option<Ride>> for RideSummary {
    fn from(ride: Option<Ride>) -> Self {
        match ride {
            Some(ride) => Self {
                passenger: ride.passenger,
                driver: ride.driver.unwrap_or_else(Uuid::nil),
                distance: ride.distance,
                status: ride.status,
                fare: ride.fare,
            },
            None => Self::default(),
        }
    }
}

#[test]
fn new_ride_rejects_zero_distance_or_fare_test() {
    let passenger = Uuid::new_v4();

    assert!(Ride::new(1, passenger, 0, 100)
        .unwrap_err()
        .is_invalid_input_error());
    assert!(Ride::new(1, passenger, 5, 0)
        .unwrap_err()
        .is_invalid_input_error());

    let ride = Ride::new(1, passenger, 5, 100).unwrap();
    assert_eq!(ride.status, Status::Requested);
    assert_eq!(ride.driver, None);
    assert!(!ride.completed);
}

#[test]
fn ride_completion_path_test() {
    let passenger = Uuid::new_v4();
    let driver = Uuid::new_v4();
    let mut ride = Ride::new(1, passenger, 5, 100).unwrap();

    // cannot complete before a driver accepts
    assert!(ride.complete().unwrap_err().is_invalid_state_error());

    ride.accept(driver).unwrap();
    assert_eq!(ride.status, Status::Accepted);
    assert_eq!(ride.driver, Some(driver));

    // driver is set at most once
    assert!(ride
        .accept(Uuid::new_v4())
        .unwrap_err()
        .is_invalid_state_error());
    assert_eq!(ride.driver, Some(driver));

    // an accepted ride can no longer be cancelled
    assert!(ride.cancel().unwrap_err().is_invalid_state_error());

    assert_eq!(ride.complete().unwrap(), driver);
    assert_eq!(ride.status, Status::Completed);
    assert!(ride.completed);

    assert!(ride.complete().unwrap_err().is_invalid_state_error());
    assert!(ride.cancel().unwrap_err().is_invalid_state_error());
    assert!(ride
        .accept(Uuid::new_v4())
        .unwrap_err()
        .is_invalid_state_error());
}

#[test]
fn ride_cancellation_path_test() {
    let passenger = Uuid::new_v4();
    let mut ride = Ride::new(1, passenger, 5, 100).unwrap();

    assert_eq!(ride.cancel().unwrap(), passenger);
    assert_eq!(ride.status, Status::Cancelled);
    assert!(ride.status.is_terminal());

    assert!(ride.cancel().unwrap_err().is_invalid_state_error());
    assert!(ride
        .accept(Uuid::new_v4())
        .unwrap_err()
        .is_invalid_state_error());
    assert!(ride.complete().unwrap_err().is_invalid_state_error());
}

#[test]
fn completed_flag_guards_payout_test() {
    let driver = Uuid::new_v4();
    let mut ride = Ride::new(1, Uuid::new_v4(), 5, 100).unwrap();
    ride.accept(driver).unwrap();

    // a stale flag alone is enough to refuse a second payout
    ride.completed = true;
    assert!(ride.complete().unwrap_err().is_invalid_state_error());
    assert_eq!(ride.status, Status::Accepted);
}

#[test]
fn ride_participation_test() {
    let passenger = Uuid::new_v4();
    let driver = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let mut ride = Ride::new(1, passenger, 5, 100).unwrap();

    assert!(ride.is_available());
    assert!(!ride.is_active_for(&passenger));

    ride.accept(driver).unwrap();
    assert!(!ride.is_available());
    assert!(ride.is_active_for(&passenger));
    assert!(ride.is_active_for(&driver));
    assert!(!ride.is_active_for(&stranger));

    ride.complete().unwrap();
    assert!(ride.is_completed_for(&passenger));
    assert!(ride.is_completed_for(&driver));
    assert!(!ride.is_completed_for(&stranger));
}

#[test]
fn ride_summary_test() {
    let missing = RideSummary::from(None);
    assert_eq!(missing, RideSummary::default());
    assert!(!missing.exists());
    assert!(missing.driver.is_nil());
    assert_eq!(missing.status, Status::Requested);

    let passenger = Uuid::new_v4();
    let ride = Ride::new(7, passenger, 5, 100).unwrap();
    let summary = RideSummary::from(Some(ride));
    assert!(summary.exists());
    assert_eq!(summary.passenger, passenger);
    assert!(summary.driver.is_nil());
    assert_eq!(summary.distance, 5);
    assert_eq!(summary.fare, 100);
}
