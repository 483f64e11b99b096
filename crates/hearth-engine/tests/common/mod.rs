#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;
use uuid::Uuid;

use hearth_db::Database;
use hearth_engine::{Deadline, Engine, EngineConfig, Notifier};
use hearth_types::models::{Actor, Comment, Reply, Story};

pub const NO_DEADLINE: Deadline = Deadline::none();

pub struct Harness {
    pub engine: Engine,
    pub db: Arc<Database>,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let db = Arc::new(Database::open(&dir.path().join("hearth.db")).expect("open db"));
        let engine = Engine::new(db.clone(), Notifier::new(), EngineConfig::default());
        Self {
            engine,
            db,
            _dir: dir,
        }
    }

    pub fn user(&self, username: &str) -> Actor {
        let id = Uuid::new_v4();
        self.db
            .create_user(&id.to_string(), username, "not-a-real-hash")
            .expect("create user");
        Actor::new(id, username)
    }

    pub fn story(&self, author: &Actor) -> Story {
        self.engine
            .create_story(author, "A title", "Once upon a time", NO_DEADLINE)
            .expect("create story")
    }

    pub fn comment(&self, author: &Actor, story: &Story) -> Comment {
        self.engine
            .create_comment(author, story.id, "nice", NO_DEADLINE)
            .expect("create comment")
    }

    pub fn reply(&self, author: &Actor, comment: &Comment) -> Reply {
        self.engine
            .create_reply(author, comment.id, "agreed", NO_DEADLINE)
            .expect("create reply")
    }

    /// Row count of `table` matching an optional raw WHERE clause.
    pub fn count(&self, table: &str, filter: &str) -> i64 {
        let sql = if filter.is_empty() {
            format!("SELECT COUNT(*) FROM {table}")
        } else {
            format!("SELECT COUNT(*) FROM {table} WHERE {filter}")
        };
        self.db
            .with_conn_mut(|conn| {
                conn.query_row(&sql, [], |r| r.get(0))
                    .map_err(hearth_db::StoreError::from)
            })
            .expect("count rows")
    }
}
