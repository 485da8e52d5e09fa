pub mod auth;
pub mod comments;
pub mod favorites;
pub mod meetups;
pub mod movies;
pub mod ratings;
pub mod tmdb;
pub mod users;
