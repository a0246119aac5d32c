use std::env;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::error::{config_error, Error};

pub const ADDR_VAR: &str = "CARPOOL_ADDR";
pub const REFUSED_ACCOUNTS_VAR: &str = "CARPOOL_REFUSED_ACCOUNTS";

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    /// Accounts the vault will never pay out to.
    pub refused_accounts: Vec<Uuid>,
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up
    /// a `.env` file.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(err.into()),
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<Option<String>, Error>,
    {
        let addr: SocketAddr = lookup(ADDR_VAR)?
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()?;

        let refused_accounts = lookup(REFUSED_ACCOUNTS_VAR)?
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|account| !account.is_empty())
            .map(|account| Uuid::parse_str(account).map_err(config_error))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            addr,
            refused_accounts,
        })
    }
}

#[test]
fn default_config_test() {
    let config = Config::from_lookup(|_| Ok(None)).unwrap();

    assert_eq!(config.addr, DEFAULT_ADDR.parse().unwrap());
    assert!(config.refused_accounts.is_empty());
}

#[test]
fn config_overrides_test() {
    let account = Uuid::new_v4();
    let accounts = format!(" {}, ", account);

    let config = Config::from_lookup(|key| match key {
        ADDR_VAR => Ok(Some("0.0.0.0:8080".into())),
        REFUSED_ACCOUNTS_VAR => Ok(Some(accounts.clone())),
        _ => Ok(None),
    })
    .unwrap();

    assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
    assert_eq!(config.refused_accounts, vec![account]);
}

#[test]
fn invalid_config_test() {
    let err = Config::from_lookup(|key| match key {
        ADDR_VAR => Ok(Some("not an address".into())),
        _ => Ok(None),
    })
    .unwrap_err();
    assert!(err.is_internal());

    let err = Config::from_lookup(|key| match key {
        REFUSED_ACCOUNTS_VAR => Ok(Some("nobody".into())),
        _ => Ok(None),
    })
    .unwrap_err();
    assert!(err.is_internal());
}
