//! Command-line configuration
//!
//! Both binaries are configured entirely from their arguments; logging is
//! controlled separately through `RUST_LOG`.

use clap::error::ErrorKind;
use clap::Parser;

/// Default listening port
pub const DEFAULT_PORT: u16 = 80;

/// Default listening address (all IPv4 interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "linechat=info";

/// Chat server arguments
#[derive(Debug, Parser)]
#[command(name = "linechat-server", version, about = "Line-oriented multi-client chat server")]
pub struct ServerArgs {
    /// TCP port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,
}

impl ServerArgs {
    /// `host:port` string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chat client arguments
#[derive(Debug, Parser)]
#[command(name = "linechat-client", version, about = "Terminal client for linechat")]
pub struct ClientArgs {
    /// Server IP address
    #[arg(short = 'a', long = "address")]
    pub address: String,

    /// Server port number
    #[arg(short = 'p', long = "port")]
    pub port: u16,

    /// Your username
    #[arg(short = 'u', long = "username")]
    pub username: String,
}

/// Parse process arguments, exiting on failure
///
/// `--help` and `--version` exit with status 0; any other argument error
/// prints usage and exits with status 1.
pub fn parse_or_exit<T: Parser>() -> T {
    T::try_parse().unwrap_or_else(|err| {
        let code = match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        };
        let _ = err.print();
        std::process::exit(code);
    })
}
