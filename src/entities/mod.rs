mod event;
mod message;
mod ride;

pub use event::Event;
pub use message::{Message, MAX_MESSAGE_LENGTH};
pub use ride::{Amount, Distance, Ride, RideId, RideSummary, Status as RideStatus};
