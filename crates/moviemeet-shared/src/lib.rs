//! Wire types shared between the movie meetup server and its clients.

pub mod api;
mod models;

pub use models::*;
