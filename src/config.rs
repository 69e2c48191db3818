use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub upload_dir: String,
    pub environment: String,
    pub remember_days: i64,
    pub secret_key: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/notesapp.db".to_string());

        let upload_dir =
            env::var("UPLOAD_DIR").unwrap_or_else(|_| "./static/uploads".to_string());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let remember_days = env::var("REMEMBER_DAYS")
            .unwrap_or_else(|_| "365".to_string())
            .parse()
            .map_err(|_| "Invalid REMEMBER_DAYS")?;

        let secret_key =
            env::var("SECRET_KEY").map_err(|_| "SECRET_KEY must be set for session signing")?;

        Ok(Config {
            server_host,
            server_port,
            database_path,
            upload_dir,
            environment,
            remember_days,
            secret_key,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Session cookies only carry the `Secure` attribute in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
