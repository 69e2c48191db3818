//! Form parsing and validation.
//!
//! Handlers receive url-encoded bodies as raw `(name, value)` pairs so that
//! multi-select fields (repeated keys) survive decoding. Each form type
//! pulls its fields out of those pairs and validates them, collecting every
//! field error before failing with [`AppError::Validation`].

use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::{
    ERR_EMAIL_TAKEN, ERR_FIELD_REQUIRED, ERR_INVALID_CHOICE, ERR_PASSWORD_MISMATCH,
    ERR_USERNAME_TAKEN, MAX_EMAIL_LEN, MAX_TITLE_LEN, MAX_USERNAME_LEN,
};
use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::User;

/// Raw url-encoded form body, in submission order
pub type FormFields = Vec<(String, String)>;

/// Field-scoped validation messages, rendered as `{"field": ["message", ...]}`
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for one field
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok` when nothing was recorded
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

/// First value submitted for `name`, or empty
fn value(fields: &[(String, String)], name: &str) -> String {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

/// Every value submitted for `name`
fn values(fields: &[(String, String)], name: &str) -> Vec<String> {
    fields
        .iter()
        .filter(|(key, _)| key == name)
        .map(|(_, v)| v.clone())
        .collect()
}

fn is_checked(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "on" | "true" | "1"
    )
}

fn check_required(errors: &mut FormErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, ERR_FIELD_REQUIRED);
        return false;
    }
    true
}

fn check_max_len(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("Field cannot be longer than {} characters.", max),
        );
    }
}

/// Resolve a multi-select submission against the ids the user may pick
///
/// Blank entries are skipped and repeats collapse; anything else that is not
/// one of `choices` fails the whole field and yields `None`.
pub fn resolve_selection(raw: &[String], choices: &[i64]) -> Option<Vec<i64>> {
    let mut selected = Vec::new();
    for entry in raw {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let id: i64 = entry.parse().ok()?;
        if !choices.contains(&id) {
            return None;
        }
        if !selected.contains(&id) {
            selected.push(id);
        }
    }
    Some(selected)
}

// =============================================================================
// Account Forms
// =============================================================================

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub checked_password: String,
}

impl RegistrationForm {
    pub fn from_fields(fields: &[(String, String)]) -> Self {
        Self {
            username: value(fields, "username").trim().to_string(),
            email: User::normalize_email(&value(fields, "email")),
            password: value(fields, "password"),
            checked_password: value(fields, "checked_password"),
        }
    }

    /// Presence, length, confirmation and uniqueness checks
    ///
    /// A username and an email that both collide are reported together.
    pub async fn validate(&self, db: &Db) -> Result<()> {
        let mut errors = FormErrors::default();

        if check_required(&mut errors, "username", &self.username) {
            check_max_len(&mut errors, "username", &self.username, MAX_USERNAME_LEN);
            if db.username_exists(&self.username).await? {
                errors.add("username", ERR_USERNAME_TAKEN);
            }
        }

        if check_required(&mut errors, "email", &self.email) {
            check_max_len(&mut errors, "email", &self.email, MAX_EMAIL_LEN);
            if db.email_exists(&self.email).await? {
                errors.add("email", ERR_EMAIL_TAKEN);
            }
        }

        check_required(&mut errors, "password", &self.password);

        if self.checked_password != self.password {
            errors.add("checked_password", ERR_PASSWORD_MISMATCH);
        }

        errors.into_result()
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

impl LoginForm {
    pub fn from_fields(fields: &[(String, String)]) -> Self {
        Self {
            email: User::normalize_email(&value(fields, "email")),
            password: value(fields, "password"),
            remember: is_checked(&value(fields, "remember")),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = FormErrors::default();
        check_required(&mut errors, "email", &self.email);
        check_required(&mut errors, "password", &self.password);
        errors.into_result()
    }
}

// =============================================================================
// Note & Notebook Forms
// =============================================================================

#[derive(Debug, Clone)]
pub struct NoteForm {
    pub title: String,
    pub description: String,
    /// Raw notebook ids from the multi-select
    pub notebooks: Vec<String>,
}

impl NoteForm {
    pub fn from_fields(fields: &[(String, String)]) -> Self {
        Self {
            title: value(fields, "title").trim().to_string(),
            description: value(fields, "description"),
            notebooks: values(fields, "notebooks"),
        }
    }

    /// Validate and return the selected notebook ids, all owned by `owner`
    pub async fn validate(&self, db: &Db, owner: i64) -> Result<Vec<i64>> {
        let mut errors = FormErrors::default();

        if check_required(&mut errors, "title", &self.title) {
            check_max_len(&mut errors, "title", &self.title, MAX_TITLE_LEN);
        }
        check_required(&mut errors, "description", &self.description);

        let choices: Vec<i64> = db
            .list_notebooks(owner)
            .await?
            .into_iter()
            .map(|nb| nb.id)
            .collect();
        let selected = resolve_selection(&self.notebooks, &choices).unwrap_or_else(|| {
            errors.add("notebooks", ERR_INVALID_CHOICE);
            Vec::new()
        });

        errors.into_result()?;
        Ok(selected)
    }
}

#[derive(Debug, Clone)]
pub struct NotebookForm {
    pub title: String,
    /// Raw note ids from the multi-select
    pub notes: Vec<String>,
}

impl NotebookForm {
    pub fn from_fields(fields: &[(String, String)]) -> Self {
        Self {
            title: value(fields, "title").trim().to_string(),
            notes: values(fields, "notes"),
        }
    }

    /// Validate and return the selected note ids, all owned by `owner`
    pub async fn validate(&self, db: &Db, owner: i64) -> Result<Vec<i64>> {
        let mut errors = FormErrors::default();

        if check_required(&mut errors, "title", &self.title) {
            check_max_len(&mut errors, "title", &self.title, MAX_TITLE_LEN);
        }

        let choices: Vec<i64> = db
            .list_notes(owner)
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();
        let selected = resolve_selection(&self.notes, &choices).unwrap_or_else(|| {
            errors.add("notes", ERR_INVALID_CHOICE);
            Vec::new()
        });

        errors.into_result()?;
        Ok(selected)
    }
}

/// Rename form shared by notes and notebooks
#[derive(Debug, Clone)]
pub struct TitleForm {
    pub title: String,
}

impl TitleForm {
    pub fn from_fields(fields: &[(String, String)]) -> Self {
        Self {
            title: value(fields, "title").trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = FormErrors::default();
        if check_required(&mut errors, "title", &self.title) {
            check_max_len(&mut errors, "title", &self.title, MAX_TITLE_LEN);
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn validation_errors(result: Result<()>) -> FormErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_selection_ignores_blanks_and_repeats() {
        let raw = vec!["".to_string(), "2".to_string(), " ".to_string(), "2".to_string()];
        assert_eq!(resolve_selection(&raw, &[1, 2]), Some(vec![2]));
    }

    #[test]
    fn test_resolve_selection_rejects_foreign_ids() {
        assert!(resolve_selection(&["3".to_string()], &[1, 2]).is_none());
        assert!(resolve_selection(&["abc".to_string()], &[1, 2]).is_none());
    }

    #[test]
    fn test_login_form_remember_flag() {
        let form = LoginForm::from_fields(&fields(&[
            ("email", " Alice@Example.com"),
            ("password", "pw"),
            ("remember", "y"),
        ]));
        assert_eq!(form.email, "alice@example.com");
        assert!(form.remember);
        assert!(form.validate().is_ok());

        let form = LoginForm::from_fields(&fields(&[("email", "a@b.c"), ("password", "pw")]));
        assert!(!form.remember);
    }

    #[test]
    fn test_login_form_requires_fields() {
        let errors = validation_errors(LoginForm::from_fields(&[]).validate());
        assert_eq!(errors.field("email"), [ERR_FIELD_REQUIRED]);
        assert_eq!(errors.field("password"), [ERR_FIELD_REQUIRED]);
    }

    #[test]
    fn test_title_form_limits() {
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        let errors = validation_errors(TitleForm::from_fields(&fields(&[("title", &long)])).validate());
        assert_eq!(errors.field("title").len(), 1);

        let errors = validation_errors(TitleForm::from_fields(&fields(&[("title", "  ")])).validate());
        assert_eq!(errors.field("title"), [ERR_FIELD_REQUIRED]);

        assert!(TitleForm::from_fields(&fields(&[("title", "Work")]))
            .validate()
            .is_ok());
    }

    #[tokio::test]
    async fn test_registration_reports_every_problem() {
        let db = Db::open_in_memory().await.unwrap();
        db.create_user("alice", "alice@example.com", "hash")
            .await
            .unwrap();

        let form = RegistrationForm::from_fields(&fields(&[
            ("username", "alice"),
            ("email", "ALICE@example.com"),
            ("password", "pw123"),
            ("checked_password", "pw124"),
        ]));
        let errors = validation_errors(form.validate(&db).await);

        assert_eq!(errors.field("username"), [ERR_USERNAME_TAKEN]);
        assert_eq!(errors.field("email"), [ERR_EMAIL_TAKEN]);
        assert_eq!(errors.field("checked_password"), [ERR_PASSWORD_MISMATCH]);
        assert!(errors.field("password").is_empty());
    }

    #[tokio::test]
    async fn test_registration_accepts_fresh_account() {
        let db = Db::open_in_memory().await.unwrap();
        let form = RegistrationForm::from_fields(&fields(&[
            ("username", "bob"),
            ("email", "bob@example.com"),
            ("password", "pw"),
            ("checked_password", "pw"),
        ]));
        assert!(form.validate(&db).await.is_ok());
    }

    #[tokio::test]
    async fn test_note_form_resolves_owned_notebooks_only() {
        let db = Db::open_in_memory().await.unwrap();
        let alice = db.create_user("alice", "a@example.com", "h").await.unwrap();
        let bob = db.create_user("bob", "b@example.com", "h").await.unwrap();
        let work = db.create_notebook(alice.id, "Work", &[]).await.unwrap();
        let bobs = db.create_notebook(bob.id, "Bobs", &[]).await.unwrap();

        let form = NoteForm::from_fields(&fields(&[
            ("title", "Todo"),
            ("description", "ship it"),
            ("notebooks", ""),
            ("notebooks", &work.id.to_string()),
        ]));
        assert_eq!(form.validate(&db, alice.id).await.unwrap(), vec![work.id]);

        let form = NoteForm::from_fields(&fields(&[
            ("title", "Todo"),
            ("description", "ship it"),
            ("notebooks", &bobs.id.to_string()),
        ]));
        let errors = validation_errors(form.validate(&db, alice.id).await.map(|_| ()));
        assert_eq!(errors.field("notebooks"), [ERR_INVALID_CHOICE]);
    }

    #[tokio::test]
    async fn test_notebook_form_requires_title() {
        let db = Db::open_in_memory().await.unwrap();
        let alice = db.create_user("alice", "a@example.com", "h").await.unwrap();

        let form = NotebookForm::from_fields(&fields(&[("notes", "")]));
        let errors = validation_errors(form.validate(&db, alice.id).await.map(|_| ()));
        assert_eq!(errors.field("title"), [ERR_FIELD_REQUIRED]);
    }
}
