use chrono::Utc;
use uuid::Uuid;

use hearth_db::models::{story_from_row, time_column, timestamp, uuid_column};
use hearth_types::models::SavedStory;

use crate::content::load_story;
use crate::error::{EngineError, Result, is_unique_violation};
use crate::{Deadline, Engine};

const SAVED_COLUMNS: &str = "s.id, s.author_username, s.title, s.content, s.preview, \
     s.like_count, s.dislike_count, s.score, s.edited, s.created_at, s.updated_at, \
     rl.id, rl.username, rl.created_at";

impl Engine {
    pub fn save_story(&self, username: &str, story_id: Uuid, deadline: Deadline) -> Result<SavedStory> {
        self.write("save_story", deadline, |tx| {
            let story = load_story(tx, &story_id.to_string())?.ok_or(EngineError::NotFound("story"))?;
            let saved = SavedStory {
                id: Uuid::new_v4(),
                username: username.to_string(),
                story,
                created_at: Utc::now(),
            };

            tx.execute(
                "INSERT INTO read_later (id, username, story_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                (
                    saved.id.to_string(),
                    username,
                    story_id.to_string(),
                    timestamp(saved.created_at),
                ),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::AlreadySaved
                } else {
                    e.into()
                }
            })?;
            Ok(saved)
        })
    }

    pub fn unsave_story(&self, username: &str, story_id: Uuid, deadline: Deadline) -> Result<()> {
        self.write("unsave_story", deadline, |tx| {
            let removed = tx.execute(
                "DELETE FROM read_later WHERE username = ?1 AND story_id = ?2",
                [username, story_id.to_string().as_str()],
            )?;
            if removed == 0 {
                return Err(EngineError::NotFound("saved story"));
            }
            Ok(())
        })
    }

    /// Most recently saved first.
    pub fn saved_stories(&self, username: &str, deadline: Deadline) -> Result<Vec<SavedStory>> {
        self.read(deadline, |conn| {
            let sql = format!(
                "SELECT {SAVED_COLUMNS}
                 FROM read_later rl
                 JOIN stories s ON s.id = rl.story_id
                 WHERE rl.username = ?1
                 ORDER BY rl.created_at DESC, rl.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let saved = stmt
                .query_map([username], |row| {
                    Ok(SavedStory {
                        story: story_from_row(row)?,
                        id: uuid_column(row, 11)?,
                        username: row.get(12)?,
                        created_at: time_column(row, 13)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(saved)
        })
    }
}
