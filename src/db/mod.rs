mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use chrono::Utc;
use guidebook_core::{
    Chapter, ContentEntry, ContentMap, Outline, OutlineSink, OutlineSource, Section, SectionId,
};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Guide operations
    // ============================================================

    pub fn create_guide(&self, input: CreateGuideInput) -> Result<Guide> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO guides (id, title, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.title,
                &input.description,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Guide {
            id,
            title: input.title,
            description: input.description,
            created_at: now,
            updated_at: now,
            published_at: None,
        })
    }

    pub fn get_guide(&self, id: Uuid) -> Result<Option<Guide>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let guide = conn
            .query_row(
                "SELECT id, title, description, created_at, updated_at, published_at
                 FROM guides WHERE id = ?",
                [id.to_string()],
                guide_from_row,
            )
            .optional()?;
        Ok(guide)
    }

    /// All guides, most recently updated first.
    pub fn list_guides(&self) -> Result<Vec<GuideSummary>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT g.id, g.title, g.description, g.created_at, g.updated_at, g.published_at,
                    (SELECT COUNT(*) FROM chapters c WHERE c.guide_id = g.id),
                    (SELECT COUNT(*) FROM sections s WHERE s.guide_id = g.id)
             FROM guides g ORDER BY g.updated_at DESC, g.title",
        )?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(GuideSummary {
                    guide: guide_from_row(row)?,
                    chapter_count: row.get::<_, i64>(6)? as usize,
                    section_count: row.get::<_, i64>(7)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    /// Delete a guide with everything published under it.
    pub fn delete_guide(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM guides WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Outline loading
    // ============================================================

    fn load_chapters(conn: &Connection, guide: Uuid) -> Result<Vec<Chapter>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, description, completed
             FROM chapters WHERE guide_id = ? ORDER BY position",
        )?;
        let mut chapters = stmt
            .query_map([guide.to_string()], |row| {
                let mut chapter = Chapter::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                );
                chapter.completed = row.get(3)?;
                Ok(chapter)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, completed, duration
             FROM sections WHERE guide_id = ? AND chapter_id = ? ORDER BY position",
        )?;
        for chapter in &mut chapters {
            chapter.sections = stmt
                .query_map((guide.to_string(), chapter.id.as_str()), |row| {
                    let mut section =
                        Section::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
                    section.completed = row.get(2)?;
                    section.duration = row.get(3)?;
                    Ok(section)
                })?
                .collect::<Result<Vec<_>, _>>()?;
        }

        Ok(chapters)
    }
}

impl OutlineSource for Database {
    type Error = anyhow::Error;

    fn load_outline(&self, guide: Uuid) -> Result<Outline> {
        let Some(record) = self.get_guide(guide)? else {
            bail!("guide {} not found", guide);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let chapters = Self::load_chapters(&conn, guide)?;
        let outline = Outline::from_parts(record.title, record.description, chapters)?;
        Ok(outline)
    }

    fn load_content(&self, guide: Uuid, section_id: &SectionId) -> Result<Option<ContentEntry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let entry = conn
            .query_row(
                "SELECT title, body FROM section_content WHERE guide_id = ? AND section_id = ?",
                (guide.to_string(), section_id.as_str()),
                |row| {
                    Ok(ContentEntry::new(
                        section_id.clone(),
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                    ))
                },
            )
            .optional()?;
        Ok(entry)
    }

    fn load_all_content(&self, guide: Uuid, outline: &Outline) -> Result<ContentMap> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt =
            conn.prepare("SELECT section_id, title, body FROM section_content WHERE guide_id = ?")?;
        let entries = stmt
            .query_map([guide.to_string()], |row| {
                Ok(ContentEntry::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // Foreign keys keep these in step; the filter covers databases written
        // with enforcement switched off.
        Ok(ContentMap::from_entries(
            entries
                .into_iter()
                .filter(|entry| outline.contains_section(&entry.section_id)),
        ))
    }
}

impl OutlineSink for Database {
    type Error = anyhow::Error;

    fn publish(&self, guide: Uuid, outline: &Outline, content: &ContentMap) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let guide_id = guide.to_string();
        let now = Utc::now().to_rfc3339();

        let updated = tx.execute(
            "UPDATE guides SET title = ?, description = ?, updated_at = ?, published_at = ?
             WHERE id = ?",
            (&outline.title, &outline.description, &now, &now, &guide_id),
        )?;
        if updated == 0 {
            bail!("guide {} not found", guide);
        }

        // Sections and content go with their chapters.
        tx.execute("DELETE FROM chapters WHERE guide_id = ?", [&guide_id])?;

        for (position, chapter) in outline.chapters().iter().enumerate() {
            tx.execute(
                "INSERT INTO chapters (guide_id, id, position, title, description, completed)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    &guide_id,
                    chapter.id.as_str(),
                    position as i64,
                    &chapter.title,
                    &chapter.description,
                    chapter.completed,
                ),
            )?;

            for (position, section) in chapter.sections.iter().enumerate() {
                tx.execute(
                    "INSERT INTO sections
                     (guide_id, chapter_id, id, position, title, completed, duration)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    (
                        &guide_id,
                        chapter.id.as_str(),
                        section.id.as_str(),
                        position as i64,
                        &section.title,
                        section.completed,
                        &section.duration,
                    ),
                )?;
            }
        }

        for entry in content.iter() {
            tx.execute(
                "INSERT INTO section_content (guide_id, section_id, title, body)
                 VALUES (?, ?, ?, ?)",
                (&guide_id, entry.section_id.as_str(), &entry.title, &entry.body),
            )?;
        }

        tx.commit()?;

        tracing::info!(
            %guide,
            chapters = outline.chapters().len(),
            sections = outline.section_count(),
            "Published outline"
        );
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "guidebook")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("guidebook.db"))
}

fn guide_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Guide> {
    Ok(Guide {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
        updated_at: parse_datetime(row.get::<_, String>(4)?),
        published_at: row.get::<_, Option<String>>(5)?.map(parse_datetime),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
