use std::sync::Arc;

use carpool::config::Config;
use carpool::engine::Engine;
use carpool::error::Error;
use carpool::server::{router, serve};
use carpool::treasury::Vault;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let vault = Vault::with_refused_accounts(config.refused_accounts.iter().copied());
    let engine = Engine::new(Arc::new(vault))?;

    serve(router(engine), config.addr).await
}
