use axum::extract::{Extension, Json, Query};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::entities::Event;
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct FindParams {
    #[serde(default)]
    since: usize,
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<FindParams>,
) -> Result<Json<Vec<Event>>, Error> {
    let events = api.find_events(params.since).await?;

    Ok(events.into())
}

pub async fn stream(
    Extension(api): Extension<DynAPI>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, serde_json::Error>>>, Error> {
    let receiver = api.subscribe().await?;

    let stream = receiver.map(|event| SseEvent::default().event(event.name()).json_data(event));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
