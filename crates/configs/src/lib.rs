use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub app: ApplicationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_database_name")]
    pub name: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            name: default_database_name(),
            collection: default_collection(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self { base_url: default_base_url() }
    }
}

fn default_database_url() -> String { "mongodb://localhost:27017".to_string() }
fn default_database_name() -> String { "customerdb".to_string() }
fn default_collection() -> String { "customers".to_string() }
fn default_connect_timeout() -> u64 { 10 }
fn default_smtp_port() -> u16 { 587 }
fn default_from_address() -> String { "no-reply@example.com".to_string() }
fn default_base_url() -> String { "http://localhost:8080".to_string() }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to environment
    /// variables only when the file does not exist, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = Self::load_or_env(&config_path())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    fn load_or_env(path: &str) -> Result<Self> {
        match load_from_file(path) {
            Ok(cfg) => Ok(cfg),
            Err(e)
                if e
                    .downcast_ref::<std::io::Error>()
                    .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::from_env())
            }
            Err(e) => Err(e.context(format!("failed to load config file {path}"))),
        }
    }

    pub fn from_env() -> Self {
        let env = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());

        let mut cfg = AppConfig::default();
        if let Some(host) = env("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = env("SERVER_PORT").and_then(|p| p.parse().ok()) {
            cfg.server.port = port;
        }
        if let Some(w) = env("TOKIO_WORKER_THREADS").and_then(|w| w.parse().ok()) {
            cfg.server.worker_threads = Some(w);
        }
        if let Some(name) = env("MONGODB_DATABASE") {
            cfg.database.name = name;
        }
        if let Some(coll) = env("MONGODB_COLLECTION") {
            cfg.database.collection = coll;
        }
        if let Some(url) = env("APP_URL") {
            cfg.app.base_url = url;
        }
        cfg.smtp = env("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: env("SMTP_PORT").and_then(|p| p.parse().ok()).unwrap_or_else(default_smtp_port),
            username: env("SMTP_USER").unwrap_or_default(),
            password: env("SMTP_PASSWORD").unwrap_or_default(),
            from_address: env("SMTP_FROM").unwrap_or_else(default_from_address),
        });
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        if let Some(smtp) = &self.smtp {
            smtp.validate()?;
        }
        self.app.normalize();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Fill an empty URL from `MONGODB_URI`, then from the local default.
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            self.url = std::env::var("MONGODB_URI").unwrap_or_else(|_| default_database_url());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or MONGODB_URI"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("mongodb://") || lower.starts_with("mongodb+srv://")) {
            return Err(anyhow!("database.url must start with mongodb:// or mongodb+srv://"));
        }
        if self.name.trim().is_empty() {
            return Err(anyhow!("database.name must not be empty"));
        }
        if self.collection.trim().is_empty() {
            return Err(anyhow!("database.collection must not be empty"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("database.connect_timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}

impl SmtpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("smtp.host must not be empty"));
        }
        if self.port == 0 {
            return Err(anyhow!("smtp.port must be within 1..=65535"));
        }
        if !self.from_address.contains('@') {
            return Err(anyhow!("smtp.from_address is not an email address"));
        }
        Ok(())
    }
}

impl ApplicationConfig {
    fn normalize(&mut self) {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() { default_base_url() } else { trimmed.to_string() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "mongodb://db:27017"
            name = "crm"
            collection = "people"

            [smtp]
            host = "smtp.example.com"
            port = 2525
            username = "mailer"
            password = "pw"

            [app]
            base_url = "https://crm.example.com/"
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.name, "crm");
        let smtp = cfg.smtp.as_ref().expect("smtp section");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.from_address, "no-reply@example.com");
        assert_eq!(cfg.app.base_url, "https://crm.example.com/");
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let mut cfg = parse("[database]\nurl = \"mongodb://localhost:27017\"\n").expect("parse");
        cfg.normalize_and_validate().expect("valid");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.database.collection, "customers");
        assert!(cfg.smtp.is_none());
        assert_eq!(cfg.app.base_url, "http://localhost:8080");
    }

    #[test]
    fn missing_file_falls_back_to_env() {
        let path = std::env::temp_dir().join("customer-api-no-such-config.toml");
        let cfg = AppConfig::load_or_env(path.to_str().expect("utf8 path")).expect("env fallback");
        assert!(cfg.database.url.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("customer-api-broken-{}.toml", std::process::id()));
        std::fs::write(&path, "[server\nport = 9000\n[database]\nurl = \"postgres://nope\"\n").expect("write");
        let res = AppConfig::load_or_env(path.to_str().expect("utf8 path"));
        std::fs::remove_file(&path).ok();
        assert!(res.is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let mut app = ApplicationConfig { base_url: "https://x.test/".into() };
        app.normalize();
        assert_eq!(app.base_url, "https://x.test");
    }

    #[test]
    fn rejects_non_mongodb_url() {
        let db = DatabaseConfig { url: "postgres://localhost/db".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_zero_port() {
        let mut server = ServerConfig { port: 0, ..ServerConfig::default() };
        assert!(server.normalize().is_err());
    }

    #[test]
    fn rejects_smtp_without_host() {
        let smtp = SmtpConfig {
            host: " ".into(),
            port: 25,
            username: String::new(),
            password: String::new(),
            from_address: default_from_address(),
        };
        assert!(smtp.validate().is_err());
    }
}
