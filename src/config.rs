use anyhow::Context;
use time::Duration;

const DEFAULT_TOKEN_TTL: Duration = Duration::hours(24);
const MAX_TOKEN_TTL: Duration = Duration::days(365);

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub users_table: String,
    pub ids_table: String,
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .context("JWT_SECRET must be set")?;

        let ttl = token_ttl(std::env::var("JWT_EXPIRATION").ok().as_deref());

        let users_table = table_name("USERS_TABLE_NAME", "users")?;
        let ids_table = table_name("IDS_TABLE_NAME", "ids")?;

        Ok(Self {
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            database_url,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            users_table,
            ids_table,
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
            jwt: JwtConfig { secret, ttl },
        })
    }
}

/// Reads a table name from `key`, falling back to `default`.
/// The value ends up inside SQL text, so only identifier characters are accepted.
fn table_name(key: &str, default: &str) -> anyhow::Result<String> {
    let name = std::env::var(key).unwrap_or_else(|_| default.into());
    if !is_valid_identifier(&name) {
        anyhow::bail!("{key} must match [A-Za-z_][A-Za-z0-9_]*, got {name:?}");
    }
    Ok(name)
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Token lifetime from `JWT_EXPIRATION`. Anything unparsable, non-positive
/// or longer than a year falls back to 24h.
fn token_ttl(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return DEFAULT_TOKEN_TTL;
    };
    match parse_duration(raw) {
        Some(ttl) if ttl.is_positive() && ttl <= MAX_TOKEN_TTL => ttl,
        _ => {
            tracing::warn!(value = %raw, "invalid JWT_EXPIRATION, defaulting to 24h");
            DEFAULT_TOKEN_TTL
        }
    }
}

/// Parses a sequence of `<n><unit>` terms such as `24h`, `1h30m` or `500ms`.
/// Units are `ns`, `us`, `ms`, `s`, `m`, `h` and `d`; amounts are unsigned
/// integers. Returns `None` on overflow.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let mut rest = raw.trim();
    if rest.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let amount: i64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let term = match &rest[..unit_len] {
            "ns" => Duration::nanoseconds(amount),
            "us" | "µs" => Duration::microseconds(amount),
            "ms" => Duration::milliseconds(amount),
            "s" => Duration::seconds(amount),
            "m" => Duration::seconds(amount.checked_mul(60)?),
            "h" => Duration::seconds(amount.checked_mul(3_600)?),
            "d" => Duration::seconds(amount.checked_mul(86_400)?),
            _ => return None,
        };
        rest = &rest[unit_len..];
        total = total.checked_add(term)?;
    }
    Some(total)
}
