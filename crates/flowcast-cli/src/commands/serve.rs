//! Server command implementation

use std::path::Path;

use anyhow::Result;
use flowcast_server::ServerConfig;

use super::open_engine;

pub async fn cmd_serve(
    db_path: &Path,
    config_path: Option<&Path>,
    host: &str,
    port: u16,
    no_auth: bool,
) -> Result<()> {
    println!("🚀 Starting Flowcast web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    // Comma-separated lists from the environment
    let api_keys = ServerConfig::parse_list(&std::env::var("FLOWCAST_API_KEYS").unwrap_or_default());
    let allowed_origins =
        ServerConfig::parse_list(&std::env::var("FLOWCAST_CORS_ORIGINS").unwrap_or_default());

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else if api_keys.is_empty() {
        println!("   ⚠️  No API keys configured; set FLOWCAST_API_KEYS or use --no-auth");
    } else {
        println!(
            "   🔑 API keys: {} configured (FLOWCAST_API_KEYS)",
            api_keys.len()
        );
    }
    if !allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {} (FLOWCAST_CORS_ORIGINS)",
            allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let engine = open_engine(db_path, config_path)?;

    let config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
    };

    flowcast_server::serve_with_config(engine, host, port, config).await?;

    Ok(())
}
