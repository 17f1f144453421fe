use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Nothing listens on the discard port, so connections are refused quickly.
#[allow(dead_code)]
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

pub fn run_voicecrm(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
    api_url: Option<String>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
            api_url: None,
        }
    }

    /// Point the binary at a backend through `VOICECRM_API_URL`.
    #[allow(dead_code)]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    #[allow(dead_code)]
    pub fn home(&self) -> PathBuf {
        self.home.path().to_path_buf()
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_voicecrm"));
        cmd.args(args)
            .current_dir(self.home.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env_remove("VOICECRM_API_KEY")
            .env_remove("RUST_LOG");
        match &self.api_url {
            Some(url) => cmd.env("VOICECRM_API_URL", url),
            None => cmd.env_remove("VOICECRM_API_URL"),
        };
        cmd.output().expect("failed to execute voicecrm binary")
    }

    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        let output = self.run(&["config", "path"]);
        assert!(
            output.status.success(),
            "config path should succeed\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        let path = String::from_utf8_lossy(&output.stdout);
        PathBuf::from(path.trim())
    }

    #[allow(dead_code)]
    pub fn write_config(&self, contents: &str) {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&config_path, contents).expect("write config file");
    }
}
