use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use tokio::net::TcpListener;

extern crate ps2stats;

use ps2stats::constants::{DEFAULT_SERVE_PORT, SITE_DIRECTORY};
use ps2stats::server::handle_request;

/// Serve a generated site locally.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Port for server to listen on
    #[arg(short, long, default_value_t = DEFAULT_SERVE_PORT)]
    port: u16,

    /// Directory of the generated site
    #[arg(short, long, default_value = SITE_DIRECTORY)]
    directory: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    pretty_env_logger::init();
    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let root = Arc::new(args.directory);
    debug!("(main) Serving {}", root.display());

    let listener = TcpListener::bind(addr).await?;
    info!("Serving site on http://{addr}");

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        let root = Arc::clone(&root);
        tokio::task::spawn(async move {
            let handler = move |req| handle_request(req, Arc::clone(&root));
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(handler))
                .await
            {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}
