use chrono::Utc;
use std::collections::HashMap;

use super::{links, Db};
use crate::error::{AppError, Result};
use crate::models::{Note, NoteView, Notebook};

const NOTE_COLUMNS: &str = "id, title, description, user_id, created_at";

/// Attribute changes for [`Db::update_note`]; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Join row: a notebook plus the note it is attached to
#[derive(sqlx::FromRow)]
struct LinkedNotebook {
    note_id: i64,
    #[sqlx(flatten)]
    notebook: Notebook,
}

impl Db {
    /// Insert a note and attach it to `notebook_ids` in one transaction
    pub async fn create_note(
        &self,
        user_id: i64,
        title: &str,
        description: &str,
        notebook_ids: &[i64],
    ) -> Result<Note> {
        let mut tx = self.pool.begin().await?;

        let note = sqlx::query_as::<_, Note>(&format!(
            "INSERT INTO notes (title, description, user_id, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for &notebook_id in notebook_ids {
            links::attach(&mut tx, notebook_id, note.id).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Note {} created for user {} in {} notebooks",
            note.id,
            user_id,
            notebook_ids.len()
        );

        Ok(note)
    }

    pub async fn get_note(&self, id: i64) -> Result<Note> {
        sqlx::query_as::<_, Note>(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NoteNotFound)
    }

    /// Fetch a note only if `user_id` owns it
    pub async fn get_owned_note(&self, id: i64, user_id: i64) -> Result<Note> {
        sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NoteNotFound)
    }

    /// All notes of a user in creation order
    pub async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// First `limit` notes of a user in creation order
    pub async fn recent_notes(&self, user_id: i64, limit: i64) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ? ORDER BY id LIMIT ?"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    pub async fn update_note(&self, id: i64, changes: NoteUpdate) -> Result<Note> {
        let mut tx = self.pool.begin().await?;

        let note = sqlx::query_as::<_, Note>(&format!(
            "UPDATE notes
             SET title = COALESCE(?, title), description = COALESCE(?, description)
             WHERE id = ?
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(changes.title)
        .bind(changes.description)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NoteNotFound)?;

        tx.commit().await?;

        Ok(note)
    }

    /// Delete a note; its association rows go with it
    pub async fn delete_note(&self, id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NoteNotFound);
        }

        tracing::info!("Note {} deleted", id);
        Ok(())
    }

    pub async fn note_view(&self, note: Note) -> Result<NoteView> {
        let notebooks = self.notebooks_of_note(note.id).await?;
        Ok(NoteView { note, notebooks })
    }

    /// All notes of a user, each with its notebooks
    pub async fn note_views(&self, user_id: i64) -> Result<Vec<NoteView>> {
        let notes = self.list_notes(user_id).await?;

        let links = sqlx::query_as::<_, LinkedNotebook>(
            "SELECT a.note_id, nb.id, nb.title, nb.user_id, nb.created_at
             FROM association a
             JOIN notebook nb ON nb.id = a.notebook_id
             JOIN notes n ON n.id = a.note_id
             WHERE n.user_id = ?
             ORDER BY nb.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_note: HashMap<i64, Vec<Notebook>> = HashMap::new();
        for link in links {
            by_note.entry(link.note_id).or_default().push(link.notebook);
        }

        Ok(notes
            .into_iter()
            .map(|note| NoteView {
                notebooks: by_note.remove(&note.id).unwrap_or_default(),
                note,
            })
            .collect())
    }
}
