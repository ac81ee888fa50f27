pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;
pub const DEFAULT_JWT_EXPIRATION_MINUTES: i64 = 15;
pub const DEFAULT_FACEBOOK_PROFILE_URL: &str = "https://graph.facebook.com/me";
pub const DEFAULT_GOOGLE_PROFILE_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
pub const DEFAULT_SMTP_PORT: i64 = 587;
