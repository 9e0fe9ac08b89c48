//! Loads `EPC_STORE_PATH` from the environment, once, the way the teacher's
//! `DbConfig::from_env` loads `DATABASE_URL`.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

const DEFAULT_STORE_PATH: &str = "epc-store.json";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let path = env::var("EPC_STORE_PATH").unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string());
        Self { path: PathBuf::from(path) }
    }
}

pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
