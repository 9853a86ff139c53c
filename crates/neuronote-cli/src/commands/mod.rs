pub mod auth;
pub mod config;
pub mod note;
pub mod schedule;
pub mod upload;
