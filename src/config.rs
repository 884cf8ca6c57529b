//! Environment-driven configuration.

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Base URL the mock payment gateway issues session links under.
    pub checkout_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let checkout_base_url = std::env::var("CHECKOUT_BASE_URL")
            .unwrap_or_else(|_| "https://pay.invalid/session".to_string());
        Self { port, checkout_base_url }
    }
}
