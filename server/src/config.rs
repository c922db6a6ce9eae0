use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "tictactoe-server", about = "Two-player tic-tac-toe game server")]
pub struct ServerConfig {
    /// Port to listen on, all interfaces.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory served for every path other than `/ws`.
    #[arg(long, env = "TICTACTOE_PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            public_dir: PathBuf::from("public"),
        }
    }
}
