pub mod assistant;
pub mod documents;
pub mod health;
pub mod uploads;
