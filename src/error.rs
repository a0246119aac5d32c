use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::Debug;
use std::net::AddrParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn is_invalid_state_error(&self) -> bool {
        self.code == 100
    }

    pub fn is_invalid_input_error(&self) -> bool {
        self.code == 101
    }

    pub fn is_not_found_error(&self) -> bool {
        self.code == 102
    }

    pub fn is_unauthorized_error(&self) -> bool {
        self.code == 103
    }

    pub fn is_payout_error(&self) -> bool {
        self.code == 104
    }

    pub fn is_internal(&self) -> bool {
        (1..=99).contains(&self.code)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<AddrParseError> for Error {
    fn from(err: AddrParseError) -> Self {
        config_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        authorizor_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            100 => (StatusCode::CONFLICT, self.message.as_str()),
            102 => (StatusCode::NOT_FOUND, self.message.as_str()),
            103 => (StatusCode::FORBIDDEN, self.message.as_str()),
            104 => (StatusCode::UNPROCESSABLE_ENTITY, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_state_error() -> Error {
    Error {
        code: 100,
        message: "invalid state".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: 102,
        message: "not found".into(),
    }
}

pub fn unauthorized_error() -> Error {
    Error {
        code: 103,
        message: "unauthorized".into(),
    }
}

pub fn payout_error() -> Error {
    Error {
        code: 104,
        message: "payout failed".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn config_error<T: Debug>(err: T) -> Error {
    tracing::error!("invalid configuration: {:?}", err);

    Error {
        code: 2,
        message: "configuration error".into(),
    }
}

pub fn authorizor_error<T: Debug>(err: T) -> Error {
    tracing::error!("authorization engine failure: {:?}", err);

    Error {
        code: 3,
        message: "authorizor error".into(),
    }
}

pub fn server_error<T: Debug>(err: T) -> Error {
    tracing::error!("server failure: {:?}", err);

    Error {
        code: 4,
        message: "server error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

#[test]
fn error_categories_are_distinguishable_test() {
    assert!(invalid_state_error().is_invalid_state_error());
    assert!(invalid_input_error().is_invalid_input_error());
    assert!(not_found_error().is_not_found_error());
    assert!(unauthorized_error().is_unauthorized_error());
    assert!(payout_error().is_payout_error());

    assert!(!payout_error().is_internal());
    assert!(unexpected_error().is_internal());
    assert!(server_error("boom").is_internal());
}

#[test]
fn error_response_status_test() {
    let status = |err: Error| err.into_response().status();

    assert_eq!(status(invalid_state_error()), StatusCode::CONFLICT);
    assert_eq!(status(invalid_input_error()), StatusCode::BAD_REQUEST);
    assert_eq!(status(not_found_error()), StatusCode::NOT_FOUND);
    assert_eq!(status(unauthorized_error()), StatusCode::FORBIDDEN);
    assert_eq!(status(payout_error()), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        status(unexpected_error()),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
