// Library for tests to access modules

pub mod auth;
pub mod config;
pub mod docker;
pub mod error;
pub mod models;
pub mod routes;
pub mod service;
pub mod session;
pub mod stats;
pub mod tools;
pub mod version;
