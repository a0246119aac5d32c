use axum::extract::{rejection::JsonRejection, Extension, Json, Path};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Amount, Distance, RideId, RideSummary};
use crate::error::{invalid_input_error, Error};
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    distance: Distance,
    value: Amount,
}

#[derive(Serialize, Deserialize)]
pub struct Created {
    ride_id: RideId,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    params: Result<Json<CreateParams>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), Error> {
    // negative or fractional amounts never fit the unsigned fields
    let Json(params) = params.map_err(|rejection| {
        tracing::info!("rejecting ride request body: {}", rejection);
        invalid_input_error()
    })?;

    let ride_id = api
        .request_ride(user, params.distance, params.value)
        .await?;

    Ok((StatusCode::CREATED, Json(Created { ride_id })))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<RideId>,
) -> Result<Json<RideSummary>, Error> {
    let ride = api.find_ride(id).await?;

    Ok(ride.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<RideId>,
) -> Result<StatusCode, Error> {
    api.accept_ride(user, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<RideId>,
) -> Result<StatusCode, Error> {
    api.complete_ride(user, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<RideId>,
) -> Result<StatusCode, Error> {
    api.cancel_ride(user, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn available(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<RideId>>, Error> {
    let ids = api.find_available_rides().await?;

    Ok(ids.into())
}

pub async fn active(
    Extension(api): Extension<DynAPI>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<RideId>>, Error> {
    let ids = api.find_user_active_rides(user_id).await?;

    Ok(ids.into())
}

pub async fn completed(
    Extension(api): Extension<DynAPI>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<RideId>>, Error> {
    let ids = api.find_user_completed_rides(user_id).await?;

    Ok(ids.into())
}
