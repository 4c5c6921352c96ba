use std::path::Path;

use rusqlite::{Connection, Row, params};

use hurl_core::Post;

use crate::error::{Result, StoreError};
use crate::schema;

pub struct PostArchive {
    conn: Connection,
}

impl PostArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::info!(path = %path.display(), "post archive opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Write ---

    /// Store one post. Returns `false` if a post with the same id is already
    /// archived.
    pub fn append(&self, post: &Post) -> Result<bool> {
        insert_on(&self.conn, post)
    }

    /// Store a batch in one transaction; returns how many were new.
    pub fn append_batch(&self, posts: &[Post]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        for post in posts {
            if insert_on(&tx, post)? {
                added += 1;
            }
        }
        tx.commit()?;
        tracing::debug!(added, total = posts.len(), "posts archived");
        Ok(added)
    }

    // --- Read ---

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        usize::try_from(n).map_err(|_| StoreError::InvalidData(format!("negative count {n}")))
    }

    pub fn get(&self, id: &str) -> Result<Option<Post>> {
        let mut stmt = self.conn.prepare("SELECT body FROM posts WHERE id = ?1")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(decode(row)?)),
            None => Ok(None),
        }
    }

    /// The last `limit` archived posts, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Post>> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM posts ORDER BY rowid DESC LIMIT ?1")?;
        let mut posts = collect(stmt.query([limit_param(limit)])?)?;
        posts.reverse();
        Ok(posts)
    }

    /// The last `limit` posts by one persona, oldest first.
    pub fn by_persona(&self, persona_id: &str, limit: usize) -> Result<Vec<Post>> {
        let mut stmt = self.conn.prepare(
            "SELECT body FROM posts WHERE persona_id = ?1 ORDER BY rowid DESC LIMIT ?2",
        )?;
        let mut posts = collect(stmt.query(params![persona_id, limit_param(limit)])?)?;
        posts.reverse();
        Ok(posts)
    }
}

fn insert_on(conn: &Connection, post: &Post) -> Result<bool> {
    let topics = serde_json::to_string(&post.topics)?;
    let body = serde_json::to_string(post)?;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO posts (id, persona_id, created_at, mode, language, topics, toxicity, body)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            post.id,
            post.persona_id,
            post.created_at,
            post.mode.as_str(),
            post.language,
            topics,
            post.toxicity,
            body,
        ],
    )?;
    Ok(changed == 1)
}

fn decode(row: &Row<'_>) -> Result<Post> {
    let body: String = row.get(0)?;
    Ok(serde_json::from_str(&body)?)
}

fn collect(mut rows: rusqlite::Rows<'_>) -> Result<Vec<Post>> {
    let mut posts = Vec::new();
    while let Some(row) = rows.next()? {
        posts.push(decode(row)?);
    }
    Ok(posts)
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
