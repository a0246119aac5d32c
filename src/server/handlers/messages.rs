use axum::extract::{rejection::JsonRejection, Extension, Json, Path};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::User;
use crate::entities::{Message, RideId};
use crate::error::{invalid_input_error, Error};
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct SendParams {
    text: String,
}

pub async fn send(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<RideId>,
    params: Result<Json<SendParams>, JsonRejection>,
) -> Result<StatusCode, Error> {
    let Json(params) = params.map_err(|_| invalid_input_error())?;

    api.send_message(user, id, params.text).await?;

    Ok(StatusCode::CREATED)
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<RideId>,
) -> Result<Json<Vec<Message>>, Error> {
    let messages = api.find_messages(user, id).await?;

    Ok(messages.into())
}
