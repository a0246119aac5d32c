pub mod accounts;
pub mod events;
pub mod messages;
pub mod rides;
