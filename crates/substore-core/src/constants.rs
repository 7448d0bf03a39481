/// Host port used when the operator leaves the port prompt empty
pub const DEFAULT_PORT: u16 = 3001;

/// Host directory bind-mounted into the container
pub const DATA_DIR: &str = "/root/sub-store-data";

pub const CONTAINER_NAME: &str = "sub-store";
pub const IMAGE_NAME: &str = "xream/sub-store:latest";

/// Path the image keeps its state under
pub const CONTAINER_DATA_PATH: &str = "/opt/app/data";

/// Port the backend listens on inside the container
pub const CONTAINER_PORT: u16 = 3001;

/// Backend sync schedule handed to the container
pub const BACKEND_SYNC_CRON: &str = "55 23 * * *";

pub const ENV_BACKEND_SYNC_CRON: &str = "SUB_STORE_BACKEND_SYNC_CRON";
pub const ENV_BACKEND_PATH: &str = "SUB_STORE_FRONTEND_BACKEND_PATH";
pub const ENV_BACKEND_API_URL: &str = "SUB_STORE_BACKEND_API_URL";

pub const API_PATH_PREFIX: &str = "/api-";
pub const API_PATH_RANDOM_LEN: usize = 32;

/// Name of the nginx site file under sites-available/sites-enabled
pub const NGINX_SITE_NAME: &str = "sub-store";

/// Packages installed before anything else runs
pub const SYSTEM_PACKAGES: &[&str] = &[
    "nginx",
    "certbot",
    "python3-certbot-nginx",
    "docker.io",
    "ufw",
    "cron",
];

/// Number of log lines shown when the container fails to come up
pub const FAILURE_LOG_LINES: u32 = 50;
