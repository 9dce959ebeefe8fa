pub mod app;
pub mod auth;
pub mod catalog;
pub mod coffees;
pub mod config;
pub mod error;
pub mod reports;
pub mod settings;
pub mod state;
pub mod storage;
