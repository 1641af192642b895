pub mod database;
pub mod gateway;
pub mod memory;
pub mod metrics;
pub mod providers;
pub mod storage;

pub use database::Database;
pub use gateway::PersistenceGateway;
pub use memory::InMemoryGateway;
pub use metrics::{get_metrics, init_metrics};
pub use storage::{InMemoryStorage, LocalStorage, Storage};
