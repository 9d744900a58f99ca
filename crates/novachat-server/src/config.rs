use clap::Parser;

/// novachat relay server.
#[derive(Parser, Debug)]
#[command(name = "novachat-server")]
#[command(about = "End-to-end-encrypted chat relay")]
pub struct Args {
    /// Address to bind the websocket listener on.
    #[arg(long, env = "NOVACHAT_BIND", default_value = "127.0.0.1:8080")]
    pub bind: std::net::SocketAddr,

    /// Default tracing filter, used when `RUST_LOG` is unset.
    #[arg(long, env = "NOVACHAT_LOG", default_value = "info")]
    pub log: String,
}
