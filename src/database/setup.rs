use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let schema_sql = include_str!("schema.sql");
    let statements = split_sql_statements(schema_sql);

    for (idx, statement) in statements.iter().enumerate() {
        execute_sql(conn, statement)
            .with_context(|| format!("Failed to execute statement {}", idx + 1))?;
    }

    log::info!("Document store schema ready");
    Ok(())
}

/// Drop every document and recreate the schema
pub fn reset_database(conn: &Connection) -> Result<()> {
    execute_sql(conn, "DROP TABLE IF EXISTS documents")?;
    initialize_schema(conn)?;
    log::info!("Document store reset");
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    strip_comments(sql)
        .split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Drop `--` comments, whole-line or trailing, before splitting on `;`
fn strip_comments(sql: &str) -> String {
    sql.lines()
        .map(|line| match line.find("--") {
            Some(pos) => &line[..pos],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn execute_sql(conn: &Connection, sql: &str) -> Result<()> {
    conn.execute(sql, [])
        .context("Failed to execute SQL statement")
        .map(|_| ())
}
