use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use reqwest::Url;
use std::str::FromStr;

/// Upper bound for session token lifetimes: one year.
pub const MAX_TOKEN_LIFETIME_MINUTES: i64 = 60 * 24 * 365;
/// Upper bound for password reset links: thirty days.
pub const MAX_RESET_TOKEN_HOURS: i64 = 24 * 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub jwt: JwtConfig,
    pub redis: RedisConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub host: String,
    pub port: u16,
    /// Public base URL; also the JWT issuer
    pub server_host: String,
    pub api_v1_str: String,
    pub openapi_file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_minutes: i64,
    pub email_reset_token_expire_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub command_timeout_ms: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_tls: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub from_email: Option<String>,
    pub from_name: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret_key", &"[REDACTED]")
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field(
                "refresh_token_expire_minutes",
                &self.refresh_token_expire_minutes,
            )
            .field(
                "email_reset_token_expire_hours",
                &self.email_reset_token_expire_hours,
            )
            .finish()
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_tls", &self.smtp_tls)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "[REDACTED]"))
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

const DEFAULT_PROJECT_NAME: &str = "Instagram Clone Backend";
const DEFAULT_SERVER_HOST: &str = "http://localhost:8000";
const FRONTEND_PORTS: [u16; 4] = [3000, 3001, 3002, 5000];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            api_v1_str: "/api/v1".to_string(),
            openapi_file_path: "openapi.json".to_string(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_token_expire_minutes: 30,
            refresh_token_expire_minutes: 60 * 24 * 8,
            email_reset_token_expire_hours: 48,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            command_timeout_ms: 2_000,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_tls: true,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            from_email: None,
            from_name: DEFAULT_PROJECT_NAME.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            cors: CorsConfig {
                allowed_origins: default_cors_origins(&app.server_host),
            },
            app,
            jwt: JwtConfig::default(),
            redis: RedisConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn jwt_issuer(&self) -> &str {
        &self.server_host
    }

    pub fn jwt_audience(&self) -> String {
        format!("{}/authentication/login", self.server_host)
    }
}

impl JwtConfig {
    // Lifetimes are clamped so a hand-built config can never overflow chrono.
    pub fn access_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(
            self.access_token_expire_minutes
                .clamp(1, MAX_TOKEN_LIFETIME_MINUTES),
        )
    }

    pub fn refresh_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(
            self.refresh_token_expire_minutes
                .clamp(1, MAX_TOKEN_LIFETIME_MINUTES),
        )
    }

    pub fn reset_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(
            self.email_reset_token_expire_hours
                .clamp(1, MAX_RESET_TOKEN_HOURS),
        )
    }

    /// Redis TTL for a stored refresh token, in seconds.
    pub fn refresh_token_ttl_secs(&self) -> u64 {
        u64::try_from(self.refresh_token_lifetime().num_seconds()).unwrap_or(60)
    }
}

impl RedisConfig {
    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.command_timeout_ms)
    }
}

impl EmailConfig {
    /// Emails go out only when host, port and sender are all configured.
    pub fn emails_enabled(&self) -> bool {
        self.smtp_host.is_some() && self.smtp_port.is_some() && self.from_email.is_some()
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| anyhow::anyhow!("invalid value {raw:?} for {key}"))
        })
        .transpose()
}

fn env_parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    Ok(env_parse(key)?.unwrap_or(default))
}

fn env_bool_or(key: &str, default: bool) -> Result<bool> {
    match env_opt(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => bail!("invalid boolean {v:?} for {key}"),
    }
}

/// Accepts either a comma separated list or a JSON array of origins.
pub fn parse_cors_origins(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    let origins: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str::<Vec<String>>(raw)
            .context("BACKEND_CORS_ORIGINS is not a valid JSON array")?
    } else {
        raw.split(',').map(str::to_string).collect()
    };

    origins
        .into_iter()
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .map(|o| {
            validate_cors_origin(&o)?;
            Ok(o)
        })
        .collect()
}

/// `*` or a bare `http(s)://host[:port]` origin.
fn validate_cors_origin(origin: &str) -> Result<()> {
    if origin == "*" {
        return Ok(());
    }

    let url = Url::parse(origin)
        .with_context(|| format!("invalid CORS origin {origin:?} in BACKEND_CORS_ORIGINS"))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        bail!("CORS origin {origin:?} must be an http(s) URL with a host");
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        bail!("CORS origin {origin:?} must not carry a path, query or fragment");
    }
    Ok(())
}

/// Frontend dev servers on the same host as the API.
pub fn default_cors_origins(server_host: &str) -> Vec<String> {
    let host = server_host.trim_end_matches('/');
    let base = host.strip_suffix(":8000").unwrap_or(host);
    FRONTEND_PORTS
        .iter()
        .map(|port| format!("{base}:{port}"))
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let app_defaults = AppConfig::default();
        let project_name = env_or("PROJECT_NAME", &app_defaults.project_name);
        let server_host = env_or("SERVER_HOST", &app_defaults.server_host)
            .trim_end_matches('/')
            .to_string();

        let mut api_v1_str = env_or("API_V1_STR", &app_defaults.api_v1_str);
        if !api_v1_str.starts_with('/') {
            api_v1_str.insert(0, '/');
        }

        let app = AppConfig {
            env: env_or("APP_ENV", &app_defaults.env),
            project_name: project_name.clone(),
            host: env_or("APP_HOST", &app_defaults.host),
            port: env_parse_or("APP_PORT", app_defaults.port)?,
            server_host: server_host.clone(),
            api_v1_str: api_v1_str.trim_end_matches('/').to_string(),
            openapi_file_path: env_or("OPENAPI_FILE_PATH", &app_defaults.openapi_file_path),
        };

        let allowed_origins = match env_opt("BACKEND_CORS_ORIGINS") {
            Some(raw) => parse_cors_origins(&raw)?,
            None => default_cors_origins(&server_host),
        };
        if app.env.eq_ignore_ascii_case("production") && allowed_origins.iter().any(|o| o == "*")
        {
            bail!("BACKEND_CORS_ORIGINS cannot be '*' in production");
        }

        let jwt_defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret_key: env_opt("SECRET_KEY").context("SECRET_KEY must be set")?,
            access_token_expire_minutes: env_parse_or(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                jwt_defaults.access_token_expire_minutes,
            )?,
            refresh_token_expire_minutes: env_parse_or(
                "REFRESH_TOKEN_EXPIRE_MINUTES",
                jwt_defaults.refresh_token_expire_minutes,
            )?,
            email_reset_token_expire_hours: env_parse_or(
                "EMAIL_RESET_TOKEN_EXPIRE_HOURS",
                jwt_defaults.email_reset_token_expire_hours,
            )?,
        };
        if jwt.access_token_expire_minutes <= 0
            || jwt.refresh_token_expire_minutes <= 0
            || jwt.email_reset_token_expire_hours <= 0
        {
            bail!("token lifetimes must be positive");
        }
        if jwt.access_token_expire_minutes > MAX_TOKEN_LIFETIME_MINUTES
            || jwt.refresh_token_expire_minutes > MAX_TOKEN_LIFETIME_MINUTES
        {
            bail!("token lifetimes cannot exceed {MAX_TOKEN_LIFETIME_MINUTES} minutes");
        }
        if jwt.email_reset_token_expire_hours > MAX_RESET_TOKEN_HOURS {
            bail!("EMAIL_RESET_TOKEN_EXPIRE_HOURS cannot exceed {MAX_RESET_TOKEN_HOURS}");
        }

        let redis_defaults = RedisConfig::default();
        let redis = RedisConfig {
            url: env_or("REDIS_URL", &redis_defaults.url),
            command_timeout_ms: env_parse_or(
                "REDIS_COMMAND_TIMEOUT_MS",
                redis_defaults.command_timeout_ms,
            )?,
        };

        let email = EmailConfig {
            smtp_tls: env_bool_or("SMTP_TLS", true)?,
            smtp_host: env_opt("SMTP_HOST"),
            smtp_port: env_parse("SMTP_PORT")?,
            smtp_user: env_opt("SMTP_USER"),
            smtp_password: env_opt("SMTP_PASSWORD"),
            from_email: env_opt("EMAILS_FROM_EMAIL"),
            from_name: env_or("EMAILS_FROM_NAME", &project_name),
        };

        Ok(Config {
            app,
            cors: CorsConfig { allowed_origins },
            jwt,
            redis,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 14] = [
        "APP_ENV",
        "PROJECT_NAME",
        "SERVER_HOST",
        "API_V1_STR",
        "APP_PORT",
        "BACKEND_CORS_ORIGINS",
        "SECRET_KEY",
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        "REFRESH_TOKEN_EXPIRE_MINUTES",
        "SMTP_TLS",
        "SMTP_HOST",
        "SMTP_PORT",
        "EMAILS_FROM_EMAIL",
        "EMAILS_FROM_NAME",
    ];

    fn reset_env() {
        for key in VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn cors_origins_from_comma_list() {
        let origins = parse_cors_origins("http://a.test, http://b.test/ ,").unwrap();
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn cors_origins_from_json_array() {
        let origins = parse_cors_origins(r#"["http://a.test","http://b.test"]"#).unwrap();
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);

        assert!(parse_cors_origins("[not json").is_err());
    }

    #[test]
    fn default_origins_use_frontend_ports() {
        let origins = default_cors_origins("http://localhost:8000");
        assert_eq!(
            origins,
            vec![
                "http://localhost:3000",
                "http://localhost:3001",
                "http://localhost:3002",
                "http://localhost:5000",
            ]
        );
    }

    #[test]
    fn emails_enabled_requires_host_port_and_sender() {
        let mut email = EmailConfig::default();
        assert!(!email.emails_enabled());

        email.smtp_host = Some("smtp.test".into());
        email.smtp_port = Some(587);
        assert!(!email.emails_enabled());

        email.from_email = Some("noreply@insta.test".into());
        assert!(email.emails_enabled());
    }

    #[test]
    fn audience_is_login_url() {
        let app = AppConfig::default();
        assert_eq!(app.jwt_issuer(), "http://localhost:8000");
        assert_eq!(
            app.jwt_audience(),
            "http://localhost:8000/authentication/login"
        );
    }

    #[test]
    fn debug_hides_secrets() {
        let mut config = Config::default();
        config.jwt.secret_key = "super-secret-signing-key".into();
        config.email.smtp_password = Some("smtp-pass".into());

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-signing-key"));
        assert!(!rendered.contains("smtp-pass"));
    }

    #[test]
    #[serial]
    fn from_env_requires_secret_key() {
        reset_env();
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("SECRET_KEY"));
    }

    #[test]
    #[serial]
    fn from_env_defaults() {
        reset_env();
        std::env::set_var("SECRET_KEY", "0123456789abcdef0123456789abcdef");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.project_name, DEFAULT_PROJECT_NAME);
        assert_eq!(config.app.api_v1_str, "/api/v1");
        assert_eq!(config.jwt.access_token_expire_minutes, 30);
        assert_eq!(config.jwt.refresh_token_expire_minutes, 11_520);
        assert_eq!(config.email.from_name, DEFAULT_PROJECT_NAME);
        assert!(config.email.smtp_tls);
        assert!(!config.email.emails_enabled());
        assert_eq!(config.cors.allowed_origins.len(), 4);

        reset_env();
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        reset_env();
        std::env::set_var("SECRET_KEY", "0123456789abcdef0123456789abcdef");
        std::env::set_var("PROJECT_NAME", "Snapgram");
        std::env::set_var("SERVER_HOST", "https://snapgram.test/");
        std::env::set_var("API_V1_STR", "api/v2/");
        std::env::set_var("BACKEND_CORS_ORIGINS", "https://web.snapgram.test");
        std::env::set_var("SMTP_TLS", "false");
        std::env::set_var("SMTP_HOST", "smtp.snapgram.test");
        std::env::set_var("SMTP_PORT", "2525");
        std::env::set_var("EMAILS_FROM_EMAIL", "noreply@snapgram.test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.server_host, "https://snapgram.test");
        assert_eq!(config.app.api_v1_str, "/api/v2");
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://web.snapgram.test"]
        );
        assert!(!config.email.smtp_tls);
        assert_eq!(config.email.smtp_port, Some(2525));
        assert_eq!(config.email.from_name, "Snapgram");
        assert!(config.email.emails_enabled());

        reset_env();
    }

    #[test]
    #[serial]
    fn from_env_rejects_bad_numbers() {
        reset_env();
        std::env::set_var("SECRET_KEY", "0123456789abcdef0123456789abcdef");
        std::env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "thirty");

        assert!(Config::from_env().is_err());

        std::env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "0");
        assert!(Config::from_env().is_err());

        reset_env();
    }

    #[test]
    #[serial]
    fn from_env_rejects_oversized_lifetimes() {
        reset_env();
        std::env::set_var("SECRET_KEY", "0123456789abcdef0123456789abcdef");
        std::env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", i64::MAX.to_string());
        assert!(Config::from_env().is_err());

        std::env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");
        std::env::set_var("REFRESH_TOKEN_EXPIRE_MINUTES", "9223372036854775807");
        assert!(Config::from_env().is_err());

        std::env::set_var(
            "REFRESH_TOKEN_EXPIRE_MINUTES",
            MAX_TOKEN_LIFETIME_MINUTES.to_string(),
        );
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.jwt.refresh_token_ttl_secs(),
            (MAX_TOKEN_LIFETIME_MINUTES * 60) as u64
        );

        reset_env();
    }

    #[test]
    fn lifetimes_never_overflow() {
        let jwt = JwtConfig {
            access_token_expire_minutes: i64::MAX,
            refresh_token_expire_minutes: i64::MIN,
            email_reset_token_expire_hours: i64::MAX,
            ..JwtConfig::default()
        };
        assert_eq!(
            jwt.access_token_lifetime(),
            chrono::Duration::minutes(MAX_TOKEN_LIFETIME_MINUTES)
        );
        assert_eq!(jwt.refresh_token_lifetime(), chrono::Duration::minutes(1));
        assert_eq!(jwt.refresh_token_ttl_secs(), 60);
        assert_eq!(
            jwt.reset_token_lifetime(),
            chrono::Duration::hours(MAX_RESET_TOKEN_HOURS)
        );
    }

    #[test]
    fn cors_origins_must_be_http_urls() {
        assert!(parse_cors_origins("not a url,http://ok.test").is_err());
        assert!(parse_cors_origins("ftp://files.test").is_err());
        assert!(parse_cors_origins("http://ok.test/app").is_err());
        assert!(parse_cors_origins(r#"["http://ok.test","localhost:3000"]"#).is_err());

        let origins = parse_cors_origins("*,https://ok.test:8443").unwrap();
        assert_eq!(origins, vec!["*", "https://ok.test:8443"]);
    }

    #[test]
    #[serial]
    fn from_env_rejects_malformed_cors_origin() {
        reset_env();
        std::env::set_var("SECRET_KEY", "0123456789abcdef0123456789abcdef");
        std::env::set_var("BACKEND_CORS_ORIGINS", "not a url,http://ok.test");

        let err = Config::from_env().unwrap_err();
        assert!(format!("{err:#}").contains("not a url"));

        reset_env();
    }
}
