use hearth_db::queries::{blocked_either_way, user_exists};
use hearth_db::{Database, StoreError};
use tempfile::TempDir;

fn open_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let db = Database::open(&dir.path().join("hearth.db")).expect("open db");
    (db, dir)
}

#[test]
fn migrations_are_idempotent_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hearth.db");

    {
        let db = Database::open(&path).unwrap();
        db.create_user("00000000-0000-0000-0000-00000000000a", "ada", "hash")
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let user = db.get_user_by_username("ada").unwrap().expect("user survives reopen");
    assert_eq!(user.id, "00000000-0000-0000-0000-00000000000a");

    let version: i64 = db
        .with_conn(|conn| {
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
                .map_err(StoreError::from)
        })
        .unwrap();
    assert_eq!(version, 3);
}

#[test]
fn usernames_are_unique() {
    let (db, _dir) = open_db();
    db.create_user("id-1", "ada", "hash").unwrap();
    let err = db.create_user("id-2", "ada", "hash").unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(db.get_user_by_username("ada").unwrap().unwrap().id, "id-1");
}

#[test]
fn failed_transaction_rolls_back() {
    let (db, _dir) = open_db();

    let result: Result<(), StoreError> = db.transaction(|tx| {
        tx.execute(
            "INSERT INTO users (id, username, password, created_at) VALUES ('x', 'ghost', 'h', 'now')",
            [],
        )?;
        // Violates the CHECK constraint on follows
        tx.execute(
            "INSERT INTO follows (follower, followee, created_at) VALUES ('ghost', 'ghost', 'now')",
            [],
        )?;
        Ok(())
    });

    assert!(result.is_err());
    assert!(db.get_user_by_username("ghost").unwrap().is_none());
}

#[test]
fn readers_see_committed_writes() {
    let (db, _dir) = open_db();
    db.create_user("id-1", "ada", "hash").unwrap();
    db.create_user("id-2", "grace", "hash").unwrap();

    db.transaction(|tx| {
        tx.execute(
            "INSERT INTO blocks (blocker, blocked, created_at) VALUES ('ada', 'grace', 'now')",
            [],
        )?;
        Ok::<_, StoreError>(())
    })
    .unwrap();

    // Round-robin over every reader
    for _ in 0..hearth_db::READER_POOL_SIZE {
        let (exists, blocked) = db
            .with_conn(|conn| {
                Ok::<_, StoreError>((
                    user_exists(conn, "grace")?,
                    blocked_either_way(conn, "grace", "ada")?,
                ))
            })
            .unwrap();
        assert!(exists);
        assert!(blocked);
    }
}
