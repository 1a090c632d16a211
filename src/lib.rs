pub mod config;
pub mod database;
pub mod deck;
pub mod models;
pub mod services;
pub mod web;

#[cfg(test)]
mod testing;
