pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod reconcile;
pub mod routes;
pub mod tmdb;

pub use config::Config;
pub use db::DbPool;
