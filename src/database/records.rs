//! Append-only records: scoring audit trail and survivor overrides

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use super::documents;
use super::paths;
use crate::domain::{AuditRecord, SurvivorOverride};

pub fn append_audit_record(conn: &Connection, record: &AuditRecord) -> Result<()> {
    let path = format!("{}/{}", paths::audit_records(&record.pool_id), record.run_id);
    documents::create_document(conn, &path, record)
}

pub fn list_audit_records(conn: &Connection, pool_id: &str) -> Result<Vec<AuditRecord>> {
    let docs = documents::list_collection(conn, &paths::audit_records(pool_id))?;
    Ok(docs.into_iter().map(|d| d.data).collect())
}

/// Store an override under a time-ordered id; returns the id
pub fn append_override(conn: &Connection, pool_id: &str, record: &SurvivorOverride) -> Result<String> {
    let id = format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S%6f"), record.user_id);
    let path = format!("{}/{}", paths::overrides(pool_id), id);
    documents::create_document(conn, &path, record)?;
    Ok(id)
}

pub fn list_overrides(conn: &Connection, pool_id: &str) -> Result<Vec<SurvivorOverride>> {
    let docs = documents::list_collection(conn, &paths::overrides(pool_id))?;
    Ok(docs.into_iter().map(|d| d.data).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::memory_conn;
    use crate::domain::{OverrideAction, ScoringTrigger};

    #[test]
    fn test_audit_records_cannot_be_rewritten() {
        let conn = memory_conn();
        let mut record = AuditRecord::start("p1", 4, ScoringTrigger::Admin);
        record.step("scored 3 users");
        append_audit_record(&conn, &record).unwrap();
        assert!(append_audit_record(&conn, &record).is_err());
        assert_eq!(list_audit_records(&conn, "p1").unwrap(), vec![record]);
    }

    #[test]
    fn test_overrides_are_listed() {
        let conn = memory_conn();
        let record = SurvivorOverride {
            user_id: "ann".to_string(),
            action: OverrideAction::Reinstate,
            week: 3,
            reason: "game was rescheduled".to_string(),
            created_at: Utc::now(),
        };
        let id = append_override(&conn, "p1", &record).unwrap();
        assert!(id.ends_with("-ann"));
        assert_eq!(list_overrides(&conn, "p1").unwrap(), vec![record]);
    }
}
