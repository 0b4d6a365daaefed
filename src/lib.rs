pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod relay;
