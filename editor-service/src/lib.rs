pub mod config;
pub mod dtos;
pub mod handlers;
pub mod markup;
pub mod models;
pub mod services;
pub mod startup;
pub mod state;
pub mod upload;
