use chrono::Utc;
use std::collections::HashMap;

use super::{links, Db};
use crate::error::{AppError, Result};
use crate::models::{Note, Notebook, NotebookView};

const NOTEBOOK_COLUMNS: &str = "id, title, user_id, created_at";

/// Join row: a note plus the notebook it is attached to
#[derive(sqlx::FromRow)]
struct LinkedNote {
    notebook_id: i64,
    #[sqlx(flatten)]
    note: Note,
}

impl Db {
    /// Insert a notebook and attach `note_ids` to it in one transaction
    pub async fn create_notebook(
        &self,
        user_id: i64,
        title: &str,
        note_ids: &[i64],
    ) -> Result<Notebook> {
        let mut tx = self.pool.begin().await?;

        let notebook = sqlx::query_as::<_, Notebook>(&format!(
            "INSERT INTO notebook (title, user_id, created_at)
             VALUES (?, ?, ?)
             RETURNING {NOTEBOOK_COLUMNS}"
        ))
        .bind(title)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for &note_id in note_ids {
            links::attach(&mut tx, notebook.id, note_id).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Notebook {} created for user {} with {} notes",
            notebook.id,
            user_id,
            note_ids.len()
        );

        Ok(notebook)
    }

    pub async fn get_notebook(&self, id: i64) -> Result<Notebook> {
        sqlx::query_as::<_, Notebook>(&format!(
            "SELECT {NOTEBOOK_COLUMNS} FROM notebook WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotebookNotFound)
    }

    /// Fetch a notebook only if `user_id` owns it
    pub async fn get_owned_notebook(&self, id: i64, user_id: i64) -> Result<Notebook> {
        sqlx::query_as::<_, Notebook>(&format!(
            "SELECT {NOTEBOOK_COLUMNS} FROM notebook WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotebookNotFound)
    }

    /// All notebooks of a user in creation order
    pub async fn list_notebooks(&self, user_id: i64) -> Result<Vec<Notebook>> {
        let notebooks = sqlx::query_as::<_, Notebook>(&format!(
            "SELECT {NOTEBOOK_COLUMNS} FROM notebook WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notebooks)
    }

    /// First `limit` notebooks of a user in creation order
    pub async fn recent_notebooks(&self, user_id: i64, limit: i64) -> Result<Vec<Notebook>> {
        let notebooks = sqlx::query_as::<_, Notebook>(&format!(
            "SELECT {NOTEBOOK_COLUMNS} FROM notebook WHERE user_id = ? ORDER BY id LIMIT ?"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notebooks)
    }

    pub async fn update_notebook_title(&self, id: i64, title: &str) -> Result<Notebook> {
        let mut tx = self.pool.begin().await?;

        let notebook = sqlx::query_as::<_, Notebook>(&format!(
            "UPDATE notebook SET title = ? WHERE id = ? RETURNING {NOTEBOOK_COLUMNS}"
        ))
        .bind(title)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotebookNotFound)?;

        tx.commit().await?;

        Ok(notebook)
    }

    /// Delete a notebook; its association rows go with it, its notes stay
    pub async fn delete_notebook(&self, id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM notebook WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotebookNotFound);
        }

        tracing::info!("Notebook {} deleted", id);
        Ok(())
    }

    /// All notebooks of a user, each with its notes
    pub async fn notebook_views(&self, user_id: i64) -> Result<Vec<NotebookView>> {
        let notebooks = self.list_notebooks(user_id).await?;

        let links = sqlx::query_as::<_, LinkedNote>(
            "SELECT a.notebook_id, n.id, n.title, n.description, n.user_id, n.created_at
             FROM association a
             JOIN notes n ON n.id = a.note_id
             JOIN notebook nb ON nb.id = a.notebook_id
             WHERE nb.user_id = ?
             ORDER BY n.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_notebook: HashMap<i64, Vec<Note>> = HashMap::new();
        for link in links {
            by_notebook.entry(link.notebook_id).or_default().push(link.note);
        }

        Ok(notebooks
            .into_iter()
            .map(|notebook| NotebookView {
                notes: by_notebook.remove(&notebook.id).unwrap_or_default(),
                notebook,
            })
            .collect())
    }
}
