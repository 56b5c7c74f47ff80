use serde::Deserialize;

/// Upper bound for every configured lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 366;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub reset_token_ttl_minutes: i64,
    /// Echo password reset tokens in API responses. Development only.
    pub expose_reset_token: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required env var {key}"))
        };
        let minutes = |key: &str, default: i64| -> anyhow::Result<i64> {
            let Some(raw) = lookup(key) else {
                return Ok(default);
            };
            match raw.trim().parse::<i64>() {
                Ok(v) if (1..=MAX_TTL_MINUTES).contains(&v) => Ok(v),
                _ => Err(anyhow::anyhow!(
                    "invalid {key} {raw:?}: expected minutes between 1 and {MAX_TTL_MINUTES}"
                )),
            }
        };

        let database_url = required("DATABASE_URL")?;
        let secret = required("JWT_SECRET")?;
        let jwt = JwtConfig {
            refresh_secret: lookup("JWT_REFRESH_SECRET")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| secret.clone()),
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "budgetpro".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "budgetpro-users".into()),
            ttl_minutes: minutes("JWT_TTL_MINUTES", 15)?,
            refresh_ttl_minutes: minutes("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 7)?,
        };

        let port = match lookup("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid APP_PORT {v:?}: {e}"))?,
            None => 8080,
        };

        Ok(Self {
            database_url,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
            reset_token_ttl_minutes: minutes("RESET_TOKEN_TTL_MINUTES", 10)?,
            expose_reset_token: lookup("EXPOSE_RESET_TOKEN")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
