use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_input_error, Error};

/// Longest message body, in characters, a participant may send.
pub const MAX_MESSAGE_LENGTH: usize = 1000;

/// A note exchanged between the passenger and driver of an active ride.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Uuid, text: &str) -> Result<Self, Error> {
        let text = text.trim();

        if text.is_empty() || text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(invalid_input_error());
        }

        Ok(Self {
            sender,
            text: text.to_string(),
            timestamp: Utc::now(),
        })
    }
}

#[test]
fn message_text_test() {
    let sender = Uuid::new_v4();

    let message = Message::new(sender, "  running five minutes late \n").unwrap();
    assert_eq!(message.sender, sender);
    assert_eq!(message.text, "running five minutes late");

    assert!(Message::new(sender, "").unwrap_err().is_invalid_input_error());
    assert!(Message::new(sender, "   ").unwrap_err().is_invalid_input_error());

    let long = "x".repeat(MAX_MESSAGE_LENGTH + 1);
    assert!(Message::new(sender, &long)
        .unwrap_err()
        .is_invalid_input_error());
}
