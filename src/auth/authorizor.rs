use oso::{Oso, PolarClass};

use crate::auth::{Platform, User};
use crate::entities::Ride;
use crate::error::Error;

pub fn new() -> Result<Oso, Error> {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class())?;
    o.register_class(User::get_polar_class())?;
    o.register_class(Ride::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}

#[test]
fn platform_request_ride_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let passenger = User::new(Uuid::new_v4());
    let anonymous = User::new(Uuid::nil());

    let result = authorizor.is_allowed(passenger, "request_ride", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(anonymous, "request_ride", Platform::default());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn ride_passenger_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let passenger = User::new(Uuid::new_v4());
    let ride = Ride::new(1, passenger.id, 5, 100).unwrap();

    let result = authorizor.is_allowed(passenger, "cancel", ride.clone());
    assert_eq!(result.unwrap(), true);

    // passengers never drive their own ride
    let result = authorizor.is_allowed(passenger, "accept", ride.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(passenger, "complete", ride.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn ride_driver_role_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let driver = User::new(Uuid::new_v4());
    let mut ride = Ride::new(1, Uuid::new_v4(), 5, 100).unwrap();

    // before the ride is accepted

    let result = authorizor.is_allowed(driver, "accept", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver, "complete", ride.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver, "cancel", ride.clone());
    assert_eq!(result.unwrap(), false);

    ride.accept(driver.id).unwrap();

    // after the ride is accepted

    let result = authorizor.is_allowed(driver, "complete", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver, "cancel", ride.clone());
    assert_eq!(result.unwrap(), false);

    let other = User::new(Uuid::new_v4());
    let result = authorizor.is_allowed(other, "complete", ride.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn anonymous_user_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let anonymous = User::new(Uuid::nil());
    let ride = Ride::new(1, Uuid::new_v4(), 5, 100).unwrap();

    let result = authorizor.is_allowed(anonymous, "accept", ride.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(anonymous, "complete", ride.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(anonymous, "cancel", ride.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn ride_message_participants_test() {
    use uuid::Uuid;

    let authorizor = new().unwrap();

    let passenger = User::new(Uuid::new_v4());
    let driver = User::new(Uuid::new_v4());
    let stranger = User::new(Uuid::new_v4());
    let mut ride = Ride::new(1, passenger.id, 5, 100).unwrap();

    let result = authorizor.is_allowed(driver, "message", ride.clone());
    assert_eq!(result.unwrap(), false);

    ride.accept(driver.id).unwrap();

    let result = authorizor.is_allowed(passenger, "message", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver, "message", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(stranger, "message", ride.clone());
    assert_eq!(result.unwrap(), false);
}
