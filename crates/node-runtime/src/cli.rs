//! # Command Line
//!
//! The historical flags are single-dash with `=` (`-UIPort=10000`); they
//! are rewritten to clap's double-dash form before parsing, so both
//! spellings work. Unset flags fall back to `RM_*` environment variables.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use shared_types::DEFAULT_LEADING_ZERO_BYTES;

use crate::container::{ConfigError, NodeConfig};

#[derive(Debug, Parser)]
#[command(name = "rumor-mesh", about = "Gossip node with file sharing and an ownership chain")]
pub struct Cli {
    /// Client-facing UDP port on 127.0.0.1
    #[arg(long = "UIPort", env = "RM_UI_PORT", default_value_t = 8080)]
    pub ui_port: u16,

    /// HTTP port of the web frontend
    #[arg(long = "GUIPort", default_value_t = 8080)]
    pub gui_port: u16,

    /// Peer-facing UDP endpoint
    #[arg(long = "gossipAddr", env = "RM_GOSSIP_ADDR", default_value = "127.0.0.1:5000")]
    pub gossip_addr: String,

    /// Origin name of this node
    #[arg(long = "name", env = "RM_NAME")]
    pub name: String,

    /// Comma-separated bootstrap peers
    #[arg(long = "peers", env = "RM_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Route rumor period in seconds, 0 disables
    #[arg(long = "rtimer", env = "RM_RTIMER", default_value_t = 0)]
    pub rtimer: u64,

    /// Legacy broadcast mode
    #[arg(long = "simple")]
    pub simple: bool,

    /// PKCS#1 PEM key used to sign ownership claims
    #[arg(long = "keyFile")]
    pub key_file: Option<PathBuf>,

    /// Follow an artist: NAME=HEX_DER_PUBLIC_KEY, repeatable
    #[arg(long = "subscribe")]
    pub subscribe: Vec<String>,

    /// Leading zero bytes required of a block hash
    #[arg(long = "zeroBytes", default_value_t = DEFAULT_LEADING_ZERO_BYTES)]
    pub zero_bytes: usize,

    /// Do not mine
    #[arg(long = "noMining")]
    pub no_mining: bool,

    #[arg(long = "sharedDir", default_value = "_SharedFiles")]
    pub shared_dir: PathBuf,

    #[arg(long = "downloadsDir", default_value = "_Downloads")]
    pub downloads_dir: PathBuf,
}

/// `-flag=value` → `--flag=value`. Short flags and `--flags` are untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 {
                return arg;
            }
            match arg.to_str() {
                Some(text) if text.starts_with('-') && !text.starts_with("--") && text.len() > 2 => {
                    OsString::from(format!("-{text}"))
                }
                _ => arg,
            }
        })
        .collect()
}

impl Cli {
    /// Parse the process arguments, exiting with usage on error.
    pub fn from_env_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    pub fn into_config(self) -> Result<NodeConfig, ConfigError> {
        let mut config = NodeConfig::default();

        config.network.ui_port = self.ui_port;
        config.network.gossip_addr = Some(parse_endpoint(&self.gossip_addr)?);
        config.network.peers = self
            .peers
            .iter()
            .map(|peer| peer.trim())
            .filter(|peer| !peer.is_empty())
            .map(parse_endpoint)
            .collect::<Result<_, _>>()?;

        config.gossip.name = self.name;
        config.gossip.simple = self.simple;
        config.gossip.route_rumor_period =
            (self.rtimer > 0).then(|| Duration::from_secs(self.rtimer));

        config.files.shared_dir = self.shared_dir;
        config.files.downloads_dir = self.downloads_dir;

        config.chain.key_file = self.key_file;
        config.chain.leading_zero_bytes = self.zero_bytes;
        config.chain.mining = !self.no_mining;
        config.chain.subscriptions = self
            .subscribe
            .iter()
            .map(|entry| parse_subscription(entry))
            .collect::<Result<_, _>>()?;

        config.frontend.gui_port = self.gui_port;

        config.validate()?;
        Ok(config)
    }
}

fn parse_endpoint(text: &str) -> Result<SocketAddr, ConfigError> {
    text.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEndpoint(text.to_owned()))
}

fn parse_subscription(entry: &str) -> Result<(String, Vec<u8>), ConfigError> {
    let invalid = || ConfigError::InvalidSubscription(entry.to_owned());
    let (name, key) = entry.split_once('=').ok_or_else(invalid)?;
    if name.is_empty() {
        return Err(invalid());
    }
    let key = hex::decode(key.trim()).map_err(|_| invalid())?;
    Ok((name.to_owned(), key))
}
