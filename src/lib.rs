pub mod application;
pub mod bus;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
