//! Plume CLI — featherweight HTTP/1.1 file server.
//!
//! Serves a handful of demonstration endpoints plus GET/POST file access
//! under a directory supplied on the command line:
//!
//! ```bash
//! plume --port 4221 --directory /tmp/files
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use plume_core::{HttpServer, Router, StatusCode};

#[derive(Parser)]
#[command(
    name = "plume",
    about = "Featherweight HTTP/1.1 file server",
    version,
    after_help = "Requests are served one per connection by a single-threaded reactor."
)]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = plume_core::DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Directory served by the /files endpoints
    #[arg(long)]
    directory: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();

    let router = build_router(cli.directory.map(Arc::new));

    let addr = format!("{}:{}", cli.host, cli.port);
    HttpServer::new()
        .with_router(router)
        .bind(&addr)
        .with_context(|| format!("failed to start server on {}", addr))?
        .run()?;

    Ok(())
}

/// Register every route before the reactor starts; the router is read-only
/// from then on.
fn build_router(directory: Option<Arc<PathBuf>>) -> Router {
    let mut router = Router::new();

    router.get("/", |_req, _res| {});

    router.get("/echo/:content", |req, res| {
        res.send(req.params()["content"].clone());
        if req.header("Accept-Encoding").is_some_and(|v| v.contains("gzip")) {
            res.encode_gzip();
        }
    });

    router.get("/user-agent", |req, res| {
        res.send(req.header("User-Agent").unwrap_or_default().to_string());
    });

    if let Some(directory) = directory {
        let read_root = Arc::clone(&directory);
        router.get("/files/:filename", move |req, res| {
            res.send_file(read_root.join(&req.params()["filename"]));
        });

        let write_root = Arc::clone(&directory);
        router.post("/files/:filename", move |req, res| {
            let path = write_root.join(&req.params()["filename"]);
            match std::fs::write(&path, req.body()) {
                Ok(()) => res.set_status(StatusCode::Created),
                Err(e) => log::warn!("failed to write {}: {}", path.display(), e),
            }
        });
    }

    router
}
