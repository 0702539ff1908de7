use anyhow::Result;
use rusqlite::Connection;

use super::documents::{self, Document};
use super::paths;
use crate::domain::{Member, Pool, Season};
use crate::errors::PoolError;

pub fn get_pool(conn: &Connection, pool_id: &str) -> Result<Option<Pool>> {
    documents::get_document(conn, &paths::pool(pool_id))
}

/// Load a pool or fail with a "not found" error
pub fn require_pool(conn: &Connection, pool_id: &str) -> Result<Pool> {
    match get_pool(conn, pool_id)? {
        Some(pool) => Ok(pool),
        None => Err(PoolError::NotFound(format!("Pool {}", pool_id)).into()),
    }
}

pub fn create_pool(conn: &Connection, pool_id: &str, pool: &Pool) -> Result<()> {
    paths::validate_id(pool_id)?;
    if get_pool(conn, pool_id)?.is_some() {
        return Err(PoolError::AlreadyExists(format!("Pool {}", pool_id)).into());
    }
    documents::create_document(conn, &paths::pool(pool_id), pool)
}

pub fn save_pool(conn: &Connection, pool_id: &str, pool: &Pool) -> Result<()> {
    documents::set_document(conn, &paths::pool(pool_id), pool)
}

pub fn list_pools(conn: &Connection) -> Result<Vec<Document<Pool>>> {
    documents::list_collection(conn, paths::POOLS)
}

pub fn pools_for_season(conn: &Connection, season: Season) -> Result<Vec<Document<Pool>>> {
    let pools = list_pools(conn)?;
    Ok(pools.into_iter().filter(|p| p.data.season == season).collect())
}

/// Add or update a member; returns the updated pool
pub fn upsert_member(conn: &Connection, pool_id: &str, user_id: &str, member: Member) -> Result<Pool> {
    paths::validate_id(user_id)?;
    let mut pool = require_pool(conn, pool_id)?;
    pool.members.insert(user_id.to_string(), member);
    save_pool(conn, pool_id, &pool)?;
    Ok(pool)
}

/// Remove a member; returns whether they were present
pub fn remove_member(conn: &Connection, pool_id: &str, user_id: &str) -> Result<bool> {
    let mut pool = require_pool(conn, pool_id)?;
    let removed = pool.members.remove(user_id).is_some();
    if removed {
        save_pool(conn, pool_id, &pool)?;
    }
    Ok(removed)
}
