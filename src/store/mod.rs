pub mod categories;
pub mod database;
pub mod sets;

pub use categories::CategoryStore;
pub use database::{Database, PoolConfig, SharedDatabase};
pub use sets::SetStore;
