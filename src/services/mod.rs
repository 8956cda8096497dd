// Service exports
pub mod cache;
pub mod directory;
pub mod events;
pub mod postgres;
pub mod sweeper;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use directory::{DirectoryClient, DirectoryCollections, DirectoryError};
pub use events::{EventError, EventPublisher};
pub use postgres::{NewMatch, PostgresStore, StoreError};
pub use sweeper::{spawn_expiry_sweeper, sweep_once};
