pub mod app;
pub mod config;
pub mod db;
pub mod events;
pub mod health;
pub mod integration;
pub mod outbox;
pub mod projections;
pub mod rebuild;
pub mod repos;
pub mod routes;
pub mod services;
