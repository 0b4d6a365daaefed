use std::sync::Arc;
use sqlx::{Pool, Sqlite};
use crate::config::Config;
use crate::crypto::TokenSigner;
use crate::relay::Relay;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub tokens: Arc<TokenSigner>,
    pub relay: Relay,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, tokens: Arc<TokenSigner>, config: Arc<Config>) -> Self {
        let relay = Relay::new(
            db.clone(),
            tokens.clone(),
            config.push_timeout(),
            config.outbound_queue_capacity,
        );
        Self {
            db,
            tokens,
            relay,
            config,
        }
    }
}
