mod memory;
mod sqlite;
mod store_type;

pub use memory::InMemoryUserDirectory;
pub use sqlite::SqliteUserDirectory;
pub use store_type::{UserDirectory, user_directory_from_env};
