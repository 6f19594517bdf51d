use std::path::PathBuf;

use clap::Parser;
use kbchat_core::{Config, Endpoint};

#[derive(Parser, Debug)]
#[command(name = "kbchat", version, about = "Terminal chat client for knowledge-base question answering servers")]
pub struct Cli {
    /// Base URL of the chat server
    #[arg(long, env = "KBCHAT_SERVER_URL")]
    pub server_url: Option<String>,

    /// Endpoint selected at startup (search, kbanswer, answer)
    #[arg(short, long, env = "KBCHAT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Give up on a request after this many seconds (0 = wait forever)
    #[arg(long, env = "KBCHAT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Write logs to this file
    #[arg(long, env = "KBCHAT_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Persist the effective settings to the config file
    #[arg(long)]
    pub save_config: bool,
}

impl Cli {
    /// Overlay command-line and environment settings on top of the file config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(url) = &self.server_url {
            config.server_url = Some(url.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.default_endpoint = Some(Endpoint::from_selection(endpoint));
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = Some(secs);
        }
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
        config
    }
}
