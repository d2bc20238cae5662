use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub upload_dir: String,
    pub cart_dir: String,
    pub data_file: Option<String>,
    pub cors_origins: Vec<String>,
    pub request_timeout_seconds: u64,
    pub session_ttl_seconds: u64,
    pub cart_ttl_seconds: u64,
    pub base_url: String,
    pub payment_client_key: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_file_size: 5 * 1024 * 1024, // 5MB
            upload_dir: "public/uploads".to_string(),
            cart_dir: "data/carts".to_string(),
            data_file: None,
            cors_origins: vec!["*".to_string()],
            request_timeout_seconds: 30,
            session_ttl_seconds: 60 * 60 * 24 * 7,
            cart_ttl_seconds: 60 * 60 * 24 * 30,
            base_url: "http://localhost:3000".to_string(),
            payment_client_key: None,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                config.port = port_num;
            }
        }

        if let Ok(max_size) = env::var("MAX_FILE_SIZE") {
            if let Ok(size) = max_size.parse::<usize>() {
                config.max_file_size = size;
            }
        }

        if let Ok(upload_dir) = env::var("UPLOAD_DIR") {
            config.upload_dir = upload_dir;
        }

        if let Ok(cart_dir) = env::var("CART_DIR") {
            config.cart_dir = cart_dir;
        }

        config.data_file = non_empty_var("DATA_FILE");

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECONDS") {
            if let Ok(timeout_num) = timeout.parse::<u64>() {
                config.request_timeout_seconds = timeout_num;
            }
        }

        if let Ok(ttl) = env::var("SESSION_TTL_SECONDS") {
            if let Ok(ttl_num) = ttl.parse::<u64>() {
                config.session_ttl_seconds = ttl_num;
            }
        }

        if let Ok(ttl) = env::var("CART_TTL_SECONDS") {
            if let Ok(ttl_num) = ttl.parse::<u64>() {
                config.cart_ttl_seconds = ttl_num;
            }
        }

        if let Ok(base_url) = env::var("BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }

        config.payment_client_key = non_empty_var("PAYMENT_CLIENT_KEY");
        config.admin_email = non_empty_var("ADMIN_EMAIL");
        config.admin_password = non_empty_var("ADMIN_PASSWORD");

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Cookies get the `Secure` flag when the site is served over https
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
