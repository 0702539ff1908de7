use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::paths::split_path;

/// A stored document with its path
#[derive(Debug, Clone)]
pub struct Document<T> {
    pub path: String,
    pub id: String,
    pub data: T,
}

pub fn get_document<T: DeserializeOwned>(conn: &Connection, path: &str) -> Result<Option<T>> {
    let sql = "SELECT data FROM documents WHERE path = ?1";

    let raw: Option<String> = conn
        .query_row(sql, params![path], |row| row.get(0))
        .optional()
        .with_context(|| format!("Failed to read document {}", path))?;

    raw.map(|json| decode(path, &json)).transpose()
}

/// Insert or replace a document
pub fn set_document<T: Serialize>(conn: &Connection, path: &str, data: &T) -> Result<()> {
    let (collection, _) = split_path(path)?;
    let json = encode(path, data)?;
    let sql = "INSERT INTO documents (path, collection, data) VALUES (?1, ?2, ?3) \
               ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = CURRENT_TIMESTAMP";

    conn.execute(sql, params![path, collection, json])
        .with_context(|| format!("Failed to write document {}", path))?;
    Ok(())
}

/// Insert a document that must not exist yet (append-only records)
pub fn create_document<T: Serialize>(conn: &Connection, path: &str, data: &T) -> Result<()> {
    let (collection, _) = split_path(path)?;
    let json = encode(path, data)?;
    let sql = "INSERT INTO documents (path, collection, data) VALUES (?1, ?2, ?3)";

    conn.execute(sql, params![path, collection, json])
        .with_context(|| format!("Failed to create document {} (it may already exist)", path))?;
    Ok(())
}

/// Direct children of a collection, ordered by path
pub fn list_collection<T: DeserializeOwned>(conn: &Connection, collection: &str) -> Result<Vec<Document<T>>> {
    let sql = "SELECT path, data FROM documents WHERE collection = ?1 ORDER BY path";
    query_documents(conn, sql, collection)
}

const PREFIX_SQL: &str =
    "SELECT path, data FROM documents WHERE substr(path, 1, length(?1)) = ?1 ORDER BY path";

/// Every document whose path starts with `prefix`, ordered by path
pub fn list_by_prefix<T: DeserializeOwned>(conn: &Connection, prefix: &str) -> Result<Vec<Document<T>>> {
    query_documents(conn, PREFIX_SQL, prefix)
}

/// Raw JSON variant of [`list_by_prefix`] for callers that filter by path
/// before decoding
pub fn list_raw_by_prefix(conn: &Connection, prefix: &str) -> Result<Vec<(String, String)>> {
    list_raw(conn, PREFIX_SQL, prefix)
}

fn query_documents<T: DeserializeOwned>(conn: &Connection, sql: &str, key: &str) -> Result<Vec<Document<T>>> {
    list_raw(conn, sql, key)?
        .into_iter()
        .map(|(path, json)| {
            let data = decode(&path, &json)?;
            let id = path.rsplit('/').next().unwrap_or_default().to_string();
            Ok(Document { path, id, data })
        })
        .collect()
}

fn list_raw(conn: &Connection, sql: &str, key: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![key], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list documents for {}", key))?;
    Ok(rows)
}

/// Decode a raw document body read through [`list_raw_by_prefix`]
pub fn decode<T: DeserializeOwned>(path: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| format!("Malformed document at {}", path))
}

fn encode<T: Serialize>(path: &str, data: &T) -> Result<String> {
    serde_json::to_string(data).with_context(|| format!("Failed to serialize document {}", path))
}

/// Run `f` inside one SQLite transaction; commits on `Ok`, rolls back on `Err`.
/// The write lock is taken up front so read-modify-write callers never
/// interleave with another writer.
pub fn run_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("Failed to begin transaction")?;
    let value = f(&tx)?;
    tx.commit().context("Failed to commit transaction")?;
    Ok(value)
}
