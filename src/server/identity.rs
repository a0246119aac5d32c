use async_trait::async_trait;
use axum::extract::{FromRequest, RequestParts};
use uuid::Uuid;

use crate::auth::User;
use crate::error::{unauthorized_error, Error};

pub const USER_ID_HEADER: &str = "x-user-id";

#[async_trait]
impl<B> FromRequest<B> for User
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or_else(unauthorized_error)?;

        Ok(User::new(id))
    }
}
