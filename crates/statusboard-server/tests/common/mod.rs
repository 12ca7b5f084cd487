use std::net::SocketAddr;
use std::time::Duration;

use statusboard_server::config::ServerConfig;
use statusboard_server::{build_app, seed_event_log};

pub const AGENTS: [&str; 3] = ["Python Agent", "UI Agent", "Time Tracking Agent"];

pub struct TestServer {
    pub addr: SocketAddr,
    pub log_dir: tempfile::TempDir,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server on an empty log tracking `AGENTS`, without seeding.
    pub async fn new() -> Self {
        Self::from_config(Self::base_config()).await
    }

    /// Config with a short agent list and seeding disabled. The log path is
    /// filled in by `from_config`.
    pub fn base_config() -> ServerConfig {
        ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            agents: AGENTS.iter().map(|s| s.to_string()).collect(),
            seed_on_empty: false,
            ..ServerConfig::default()
        }
    }

    pub async fn from_config(mut config: ServerConfig) -> Self {
        let log_dir = tempfile::tempdir().unwrap();
        config.log_path = log_dir.path().join("agent_status.csv");
        config.web_root = log_dir.path().join("web").display().to_string();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, state) = build_app(config);
        seed_event_log(&state).await.unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            log_dir,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn log_path(&self) -> std::path::PathBuf {
        self.log_dir.path().join("agent_status.csv")
    }

    /// POST a status update and return the response status code.
    pub async fn update(&self, agent: &str, status: &str) -> u16 {
        reqwest::Client::new()
            .post(format!("{}/api/update/{agent}/{status}", self.base_url()))
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    }

    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        reqwest::get(format!("{}{path}", self.base_url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}
