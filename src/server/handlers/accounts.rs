use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Amount;
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct Balance {
    account: Uuid,
    balance: Amount,
}

pub async fn balance(
    Extension(api): Extension<DynAPI>,
    Path(account): Path<Uuid>,
) -> Result<Json<Balance>, Error> {
    let balance = api.find_balance(account).await?;

    Ok(Balance { account, balance }.into())
}
