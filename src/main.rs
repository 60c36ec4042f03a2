use std::sync::Arc;

use clap::Parser;
use serde_json::json;

mod app;
mod cache;
mod cli;
mod config;
mod embed;
mod resolver;
mod scrape;
mod target;
mod web;

use config::Config;
use target::{ContentId, MediaTarget};

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // also installs the `log` bridge, so `log::` records land here
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    init_logging();

    let config = Config::load_with(&args.base_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let app = Arc::new(app::App::new(&config)?);

    match args.command {
        cli::Command::Daemon {} => runtime.block_on(web::serve(app, &config.listen_addr)),

        cli::Command::Resolve { id, direct_only } => {
            let target = MediaTarget::Movie(ContentId::parse(&id)?);

            let output = if direct_only {
                match runtime.block_on(app.resolver.resolve_direct(&target)) {
                    Some(found) => json!({
                        "success": true,
                        "movieId": id,
                        "videoUrl": found.reference(),
                        "method": "jsoup",
                    }),
                    None => json!({
                        "success": false,
                        "error": "No video URL found",
                    }),
                }
            } else {
                let resolution = runtime.block_on(app.resolver.resolve(&target));
                json!({
                    "success": true,
                    "movieId": id,
                    "videoUrl": resolution.reference,
                    "method": resolution.tier,
                })
            };

            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }

        cli::Command::Embed { id } => {
            let target = MediaTarget::Movie(ContentId::parse(&id)?);
            let output = json!({
                "success": true,
                "movieId": id,
                "embedUrl": app.resolver.embed_url(&target),
            });

            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}
