pub mod app;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod state;
pub mod study;
