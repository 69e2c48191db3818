/// Maximum request body size in bytes (16MB)
/// Enforced before any handler sees an upload
pub const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// File extensions accepted by the image upload
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Multipart field carrying the uploaded files
pub const UPLOAD_FIELD: &str = "files[]";

/// URL prefix under which stored uploads are served
pub const UPLOAD_URL_PREFIX: &str = "/static/uploads";

/// Number of notebooks and notes previewed on the home page
pub const HOME_PREVIEW_LIMIT: i64 = 4;

pub const MAX_USERNAME_LEN: usize = 20;
pub const MAX_EMAIL_LEN: usize = 60;
pub const MAX_TITLE_LEN: usize = 60;

// =============================================================================
// User-facing Messages
// =============================================================================

pub const MSG_REGISTERED: &str = "Your registration is successful! You can Login now!";

/// Deliberately generic: never reveals whether the email exists
pub const MSG_AUTH_FAILED: &str = "Authentication failed. Please check your email or password!";

pub const MSG_LOGIN_REQUIRED: &str = "Please log in to access this page.";

pub const MSG_ACCOUNT_DELETED: &str = "Account is successfully deleted";

pub const MSG_NO_FILE_PART: &str = "No file part";

pub const MSG_ALLOWED_IMAGE_TYPES: &str = "Allowed image types are -> png, jpg, jpeg, gif";

pub const MSG_DELETE_NOTE_FAILED: &str = "There was a problem deleting the Note";

pub const MSG_DELETE_NOTEBOOK_FAILED: &str = "There was a problem deleting the Notebook";

// =============================================================================
// Form Validation Messages
// =============================================================================

pub const ERR_FIELD_REQUIRED: &str = "This field is required.";

pub const ERR_PASSWORD_MISMATCH: &str = "The password should be the same.";

pub const ERR_USERNAME_TAKEN: &str = "This username is already used";

pub const ERR_EMAIL_TAKEN: &str = "This email is already used";

pub const ERR_INVALID_CHOICE: &str = "Not a valid choice";
