mod data_store;

mod auth_session;
pub mod cli;
pub mod cli_error;
mod schedule;
mod setup;
pub mod web;
