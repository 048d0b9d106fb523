use anyhow::Result;
use clap::Parser;
use redis_group_query::query::{resolve_patterns, GroupQuery};
use redis_group_query::render::render_report;
use tracing_subscriber::EnvFilter;

/// Query group-related keys from Redis and display their values
#[derive(Parser)]
#[command(name = "redis-group-query", version, about)]
struct Cli {
    /// Redis host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Redis port
    #[arg(long, default_value = "6379")]
    port: u16,

    /// Redis database number
    #[arg(long, default_value = "0")]
    db: i64,

    /// Redis password (if required)
    #[arg(long)]
    password: Option<String>,

    /// Key pattern to search for (repeatable).
    /// Defaults to group:*, groups:*, *:group*, *:groups*
    #[arg(long = "pattern")]
    patterns: Vec<String>,

    /// Number of keys per SCAN iteration (default: 100)
    #[arg(long, default_value = "100")]
    scan_count: u32,

    /// Print the report as JSON instead of the terminal listing
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let url = build_url(&cli.host, cli.port, cli.db, cli.password.as_deref())?;
    let redacted = redact_url(&url);

    let client = redis::Client::open(url.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid Redis URL '{}': {}", redacted, e))?;

    let mut conn = redis::aio::ConnectionManager::new(client)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot connect to '{}': {}", redacted, e))?;

    // ConnectionManager can come up lazily; a PING round trip proves the
    // server is actually there before we start scanning
    let _: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot connect to '{}': {}", redacted, e))?;

    println!("Connected to Redis at {}:{}", cli.host, cli.port);
    tracing::info!(url = %redacted, "Connected to Redis");

    let patterns = resolve_patterns(&cli.patterns);
    tracing::info!(
        patterns = ?patterns,
        scan_count = cli.scan_count,
        "Starting group query"
    );

    let query = GroupQuery::new(conn, cli.scan_count);
    let report = query.collect(&patterns).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        render_report(&mut std::io::stdout().lock(), &report)?;
    }

    Ok(())
}

/// Build the connection URL from the discrete CLI parameters.
fn build_url(host: &str, port: u16, db: i64, password: Option<&str>) -> Result<url::Url> {
    let mut url = url::Url::parse("redis://127.0.0.1")?;
    url.set_host(Some(host))
        .map_err(|e| anyhow::anyhow!("Invalid host '{}': {}", host, e))?;
    url.set_port(Some(port))
        .map_err(|_| anyhow::anyhow!("Invalid port {}", port))?;
    url.set_path(&format!("/{}", db));
    if password.is_some() {
        // set_password percent-encodes, so any password survives the URL trip
        url.set_password(password)
            .map_err(|_| anyhow::anyhow!("Cannot set password on Redis URL"))?;
    }
    Ok(url)
}

/// Password-free rendition of the URL for logs and error messages.
fn redact_url(url: &url::Url) -> String {
    let mut redacted = url.clone();
    if redacted.password().is_some() {
        let _ = redacted.set_password(Some("***"));
    }
    redacted.to_string()
}
