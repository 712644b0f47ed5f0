//! Storage backend implementations.

mod file;
mod memory;
mod pg_url_repository;

pub use file::{FileRepositoryConfig, FileUrlRepository};
pub use memory::MemoryUrlRepository;
pub use pg_url_repository::PgUrlRepository;
