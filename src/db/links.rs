use sqlx::SqliteConnection;

use super::Db;
use crate::error::{AppError, Result};
use crate::models::{Note, Notebook};

/// Insert one association row inside the caller's transaction
///
/// Both ends must exist. Re-attaching an attached pair is a no-op. The insert
/// runs before any read so the transaction takes the write lock up front.
pub(super) async fn attach(
    conn: &mut SqliteConnection,
    notebook_id: i64,
    note_id: i64,
) -> Result<()> {
    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO association (notebook_id, note_id)
         SELECT nb.id, n.id FROM notebook nb, notes n
         WHERE nb.id = ? AND n.id = ?",
    )
    .bind(notebook_id)
    .bind(note_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted > 0 {
        return Ok(());
    }

    // Nothing inserted: either already attached or one end is missing
    let notes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE id = ?")
        .bind(note_id)
        .fetch_one(&mut *conn)
        .await?;
    if notes == 0 {
        return Err(AppError::NoteNotFound);
    }

    let notebooks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notebook WHERE id = ?")
        .bind(notebook_id)
        .fetch_one(&mut *conn)
        .await?;
    if notebooks == 0 {
        return Err(AppError::NotebookNotFound);
    }

    Ok(())
}

impl Db {
    pub async fn attach_note_to_notebook(&self, note_id: i64, notebook_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        attach(&mut tx, notebook_id, note_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Remove one association row; detaching an unattached pair is a no-op
    pub async fn detach_note_from_notebook(&self, note_id: i64, notebook_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM association WHERE notebook_id = ? AND note_id = ?")
            .bind(notebook_id)
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Notebooks a note is attached to, in creation order
    pub async fn notebooks_of_note(&self, note_id: i64) -> Result<Vec<Notebook>> {
        let notebooks = sqlx::query_as::<_, Notebook>(
            "SELECT nb.id, nb.title, nb.user_id, nb.created_at
             FROM notebook nb
             JOIN association a ON a.notebook_id = nb.id
             WHERE a.note_id = ?
             ORDER BY nb.id",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notebooks)
    }

    /// Notes attached to a notebook, in creation order
    pub async fn notes_of_notebook(&self, notebook_id: i64) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT n.id, n.title, n.description, n.user_id, n.created_at
             FROM notes n
             JOIN association a ON a.note_id = n.id
             WHERE a.notebook_id = ?
             ORDER BY n.id",
        )
        .bind(notebook_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (Db, i64) {
        let db = Db::open_in_memory().await.unwrap();
        let user = db
            .create_user("alice", "alice@example.com", "hash")
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_attach_is_idempotent() {
        let (db, owner) = setup().await;
        let work = db.create_notebook(owner, "Work", &[]).await.unwrap();
        let todo = db.create_note(owner, "Todo", "", &[]).await.unwrap();

        db.attach_note_to_notebook(todo.id, work.id).await.unwrap();
        db.attach_note_to_notebook(todo.id, work.id).await.unwrap();

        let notes = db.notes_of_notebook(work.id).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Todo");
    }

    #[tokio::test]
    async fn test_detach_is_idempotent() {
        let (db, owner) = setup().await;
        let work = db.create_notebook(owner, "Work", &[]).await.unwrap();
        let todo = db.create_note(owner, "Todo", "", &[work.id]).await.unwrap();

        db.detach_note_from_notebook(todo.id, work.id).await.unwrap();
        db.detach_note_from_notebook(todo.id, work.id).await.unwrap();

        assert!(db.notes_of_notebook(work.id).await.unwrap().is_empty());
        assert!(db.notebooks_of_note(todo.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_attaches_all_succeed() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db = crate::db::open_database(temp_dir.path().join("links.db"))
            .await
            .unwrap();
        let owner = db
            .create_user("alice", "alice@example.com", "hash")
            .await
            .unwrap()
            .id;
        let work_id = db.create_notebook(owner, "Work", &[]).await.unwrap().id;

        let mut note_ids = Vec::new();
        for i in 0..8 {
            let note = db
                .create_note(owner, &format!("Note {}", i), "", &[])
                .await
                .unwrap();
            note_ids.push(note.id);
        }

        let tasks: Vec<_> = note_ids
            .iter()
            .map(|&note_id| {
                let db = db.clone();
                tokio::spawn(async move { db.attach_note_to_notebook(note_id, work_id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(db.notes_of_notebook(work_id).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_attach_requires_both_ends() {
        let (db, owner) = setup().await;
        let work = db.create_notebook(owner, "Work", &[]).await.unwrap();
        let todo = db.create_note(owner, "Todo", "", &[]).await.unwrap();

        assert!(matches!(
            db.attach_note_to_notebook(999, work.id).await,
            Err(AppError::NoteNotFound)
        ));
        assert!(matches!(
            db.attach_note_to_notebook(todo.id, 999).await,
            Err(AppError::NotebookNotFound)
        ));
    }

    #[tokio::test]
    async fn test_deleting_either_side_removes_association() {
        let (db, owner) = setup().await;
        let work = db.create_notebook(owner, "Work", &[]).await.unwrap();
        let home = db.create_notebook(owner, "Home", &[]).await.unwrap();
        let todo = db
            .create_note(owner, "Todo", "", &[work.id, home.id])
            .await
            .unwrap();

        db.delete_notebook(home.id).await.unwrap();
        let remaining = db.notebooks_of_note(todo.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, work.id);

        db.delete_note(todo.id).await.unwrap();
        assert!(db.notes_of_notebook(work.id).await.unwrap().is_empty());

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM association")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }
}
