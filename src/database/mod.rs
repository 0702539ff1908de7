pub mod connection;
pub mod documents;
pub mod games;
pub mod paths;
pub mod picks;
pub mod pools;
pub mod records;
pub mod results;
pub mod setup;

pub use connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
pub use documents::run_transaction;

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::Connection;

    use super::setup::initialize_schema;

    pub fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn
    }
}
