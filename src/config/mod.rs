//! Config Module - environment-driven configuration

pub const DEFAULT_GROQ_MODEL: &str = "mixtral-8x7b-32768";
pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Connection settings for the invoice database.
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    /// Key-value connection string for tokio-postgres. The password key is
    /// omitted when empty (local trust-auth setups).
    pub fn conn_string(&self) -> String {
        let mut s = format!(
            "host={} port={} user={} dbname={}",
            self.host, self.port, self.user, self.name
        );
        if !self.password.is_empty() {
            s.push_str(&format!(" password={}", self.password));
        }
        s
    }
}

/// Settings for the Groq completion API.
#[derive(Clone, Debug)]
pub struct GroqConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

/// Full application configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db: DbConfig,
    pub groq: GroqConfig,
    pub port: u16,
    pub environment: String,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db = DbConfig {
            host: env_or("DB_HOST", "localhost"),
            port: env_or("DB_PORT", "5432").parse().unwrap_or(5432),
            name: env_or("DB_NAME", "invoices"),
            user: env_or("DB_USER", "postgres"),
            password: std::env::var("DB_PASSWORD").unwrap_or_default(),
        };

        let groq = GroqConfig {
            api_key: std::env::var("GROQ_API_KEY").ok().filter(|v| !v.is_empty()),
            model: env_or("GROQ_MODEL", DEFAULT_GROQ_MODEL),
            endpoint: env_or("GROQ_API_URL", DEFAULT_GROQ_API_URL),
        };

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            db,
            groq,
            port: env_or("PORT", "8000").parse().unwrap_or(8000),
            environment: env_or("ENVIRONMENT", "development"),
            allowed_origins,
        }
    }

    /// Only production restricts CORS to the configured origin list.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
