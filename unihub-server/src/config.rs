use std::env;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 5000;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL used when building verification links
    pub public_url: String,
    /// Origins the browser frontend is served from. Credentialed CORS
    /// requires them to be explicit, never a wildcard.
    pub cors_origins: Vec<String>,
    /// Controls the session cookie: when serving TLS to a separate origin
    /// this must be on (`Secure` + `SameSite=None`), otherwise the cookie
    /// stays `SameSite=Lax`. An explicit switch, not an accident of the
    /// environment.
    pub secure_cookies: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("UNIHUB_PORT")
            .map(|x| x.parse::<u16>().expect("Port must be a number"))
            .unwrap_or(DEFAULT_PORT);

        let public_url =
            env::var("UNIHUB_PUBLIC_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        let cors_origins = env::var("UNIHUB_CORS_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]);

        let secure_cookies = env::var("UNIHUB_SECURE_COOKIES")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            port,
            public_url,
            cors_origins,
            secure_cookies,
        }
    }
}
