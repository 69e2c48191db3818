pub mod note;
pub mod notebook;
pub mod user;

pub use note::{Note, NoteView};
pub use notebook::{Notebook, NotebookView};
pub use user::User;
