//! Portfolio backend API
//! User accounts, session-based authentication, and project CRUD with
//! file attachments.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
