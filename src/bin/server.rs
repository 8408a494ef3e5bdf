use bytes::Bytes;
use clap::Parser;
use cachedis::codec::DEFAULT_MAX_FRAME_SIZE;
use cachedis::config::{Config, DEFAULT_BIND, DEFAULT_PORT};
use cachedis::{server, Error};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// The address to bind to
    #[arg(short, long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Password clients must send with AUTH before running other commands
    #[arg(long, env = "CACHEDIS_PASSWORD")]
    requirepass: Option<String>,

    /// Allow commands that have not been fully tested
    #[arg(long)]
    enable_unsupported_commands: bool,

    /// Threads available to commands that run in the background
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Largest request, in bytes, the server buffers
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            bind: args.bind,
            port: args.port,
            password: args.requirepass.map(Bytes::from),
            enable_unsupported_commands: args.enable_unsupported_commands,
            workers: args.workers,
            max_frame_size: args.max_frame_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    server::run(args.into()).await
}
