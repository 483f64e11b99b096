use rusqlite::{Connection, OptionalExtension, params_from_iter};

use hearth_types::models::ReactableKind;

/// Keeps `IN (...)` lists well under SQLite's bound-parameter limit.
const CHUNK: usize = 500;

pub(crate) fn table(kind: ReactableKind) -> &'static str {
    match kind {
        ReactableKind::Story => "stories",
        ReactableKind::Comment => "comments",
        ReactableKind::Reply => "replies",
    }
}

pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Run `{prefix} (?, ?, ...)` over `ids` in chunks and return the total
/// number of affected rows.
pub(crate) fn execute_in(conn: &Connection, prefix: &str, ids: &[String]) -> rusqlite::Result<usize> {
    let mut affected = 0;
    for chunk in ids.chunks(CHUNK) {
        let sql = format!("{prefix} ({})", placeholders(chunk.len()));
        affected += conn.execute(&sql, params_from_iter(chunk.iter()))?;
    }
    Ok(affected)
}

/// Author of a reactable entity, or `None` when it does not exist.
pub(crate) fn author_of(
    conn: &Connection,
    kind: ReactableKind,
    id: &str,
) -> rusqlite::Result<Option<String>> {
    let sql = format!("SELECT author_username FROM {} WHERE id = ?1", table(kind));
    conn.query_row(&sql, [id], |row| row.get(0)).optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn execute_in_spans_chunks() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY);").unwrap();
        let ids: Vec<String> = (0..1_234).map(|i| format!("id-{i}")).collect();
        for id in &ids {
            conn.execute("INSERT INTO t (id) VALUES (?1)", [id]).unwrap();
        }

        let removed = execute_in(&conn, "DELETE FROM t WHERE id IN", &ids[..1_001]).unwrap();
        assert_eq!(removed, 1_001);
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 233);
        assert_eq!(execute_in(&conn, "DELETE FROM t WHERE id IN", &[]).unwrap(), 0);
    }
}
