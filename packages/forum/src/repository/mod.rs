// One file per table, each adding methods to `ForumRepository`.

use sqlx::sqlite::SqlitePool;

mod messages;
mod posts;
mod sessions;
mod users;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use sessions::SessionStatus;

#[derive(Clone)]
pub struct ForumRepository {
    pub(crate) pool: SqlitePool,
}

impl ForumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}
