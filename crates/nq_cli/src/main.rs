use clap::Parser;
use nq_core::{normalize_url, Error, Result};
use nq_ingest::{ingest_all, IngestPipeline, DEFAULT_CONCURRENCY};
use nq_query::{spawn_sweeper, ChatService, QueryConfig};
use nq_storage::Stores;
use nq_web::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod duration;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ask questions about ingested news articles", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "NQ_STORAGE", default_value = "memory")]
    storage: String,
    /// sqlite:// URL; defaults to a database file in the working directory
    #[arg(long, env = "NQ_DATABASE_URL")]
    database_url: Option<String>,
    #[arg(long, env = "NQ_MODEL", default_value = "ollama", help = "Model to use for inference. Available models: ollama (default), openai, deepseek, dummy")]
    model: String,
    #[arg(long, env = "NQ_MODEL_URL")]
    model_url: Option<String>,
    #[arg(long, env = "NQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "NQ_MODEL_NAME")]
    model_name: Option<String>,
    #[arg(long, env = "NQ_EMBEDDING_MODEL")]
    embedding_model: Option<String>,
    /// Per-call inference timeout (e.g. 30s, 2m)
    #[arg(long, env = "NQ_TIMEOUT", default_value = "60s")]
    timeout: HumanDuration,
    /// How long answers stay cached
    #[arg(long, env = "NQ_CACHE_TTL", default_value = "24h")]
    cache_ttl: HumanDuration,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "NQ_ADDR", default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
        /// How often expired cache entries are swept (e.g. 1h, 30m, 1h15m30s)
        #[arg(long, default_value = "1h")]
        sweep_interval: HumanDuration,
    },
    /// Answer one question
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch, analyze and store articles
    Ingest {
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Delete expired cache entries once
    Sweep,
    /// Remove stored articles
    Delete {
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },
}

impl Cli {
    fn inference_config(&self) -> nq_inference::Config {
        nq_inference::Config {
            model: self.model.clone(),
            model_url: self.model_url.clone(),
            api_key: self.api_key.clone(),
            model_name: self.model_name.clone(),
            embedding_model: self.embedding_model.clone(),
            timeout: self.timeout.0,
        }
    }

    fn query_config(&self) -> QueryConfig {
        QueryConfig {
            cache_ttl: self.cache_ttl.0,
            ..QueryConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let stores: Stores = nq_storage::create_storage(&cli.storage, cli.database_url.as_deref()).await?;
    info!(
        "💾 Storage initialized (using {}, {} articles)",
        cli.storage,
        stores.articles.count_articles().await?
    );

    let model = nq_inference::create_model(&cli.inference_config())?;
    info!("🧠 Inference model initialized (using {})", model.name());

    let mut config = cli.query_config();
    let chat = Arc::new(ChatService::with_defaults(
        stores.articles.clone(),
        stores.cache.clone(),
        model.clone(),
        config.clone(),
    ));
    info!("💾 Caching answers for {}s", chat.cache().ttl().as_secs());
    let ingestor = Arc::new(IngestPipeline::over_http(stores.articles.clone(), model.clone(), cli.timeout.0)?);

    match cli.command {
        Commands::Serve { addr, sweep_interval } => {
            config.sweep_interval = sweep_interval.0;
            info!("🧹 Sweeping the cache every {}s", config.sweep_interval.as_secs());
            let sweeper = spawn_sweeper(chat.cache(), config.sweep_interval);

            let result = nq_web::serve(AppState::new(chat, ingestor, stores.articles), addr).await;
            sweeper.abort();
            result?;
        }
        Commands::Ask { query, json } => {
            let response = chat.chat(&query.join(" ")).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.answer);
                if !response.sources.is_empty() {
                    println!("\nSources:");
                    for source in &response.sources {
                        println!("- {} ({})", source.title, source.url);
                    }
                }
            }
        }
        Commands::Ingest { urls, concurrency } => {
            let report = ingest_all(ingestor, &urls, concurrency).await;
            for article in &report.succeeded {
                println!("✅ {} ({})", article.title, article.url);
            }
            for failure in &report.failed {
                println!("❌ {}: {}", failure.url, failure.error);
            }
            if report.succeeded.is_empty() && !report.failed.is_empty() {
                return Err(Error::Ingestion(format!("All {} URL(s) failed", report.failed.len())));
            }
            if !report.failed.is_empty() {
                warn!("{} URL(s) failed", report.failed.len());
            }
        }
        Commands::Sweep => {
            let purged = chat.cache().sweep().await?;
            println!("Removed {} expired cache entr{}", purged, if purged == 1 { "y" } else { "ies" });
        }
        Commands::Delete { urls } => {
            for url in urls.iter().map(|u| normalize_url(u)) {
                if stores.articles.delete_article(&url).await? {
                    info!("🗑️ Deleted {}", url);
                    println!("🗑️ {}", url);
                } else {
                    warn!("No stored article for {}", url);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["nq", "sweep"]).unwrap();
        assert_eq!(cli.storage, "memory");
        assert_eq!(cli.timeout.0, Duration::from_secs(60));
        assert_eq!(cli.query_config().cache_ttl, Duration::from_secs(86400));
        assert!(matches!(cli.command, Commands::Sweep));
    }

    #[test]
    fn test_ask_and_ingest_args() {
        let cli = Cli::try_parse_from(["nq", "--model", "dummy", "--cache-ttl", "30m", "ask", "what", "happened?", "--json"]).unwrap();
        assert_eq!(cli.inference_config().model, "dummy");
        assert_eq!(cli.query_config().cache_ttl, Duration::from_secs(1800));
        match cli.command {
            Commands::Ask { query, json } => {
                assert_eq!(query.join(" "), "what happened?");
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["nq", "ingest", "https://a.com", "https://b.com", "--concurrency", "2"]).unwrap();
        match cli.command {
            Commands::Ingest { urls, concurrency } => {
                assert_eq!(urls.len(), 2);
                assert_eq!(concurrency, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_serve_args() {
        let cli = Cli::try_parse_from(["nq", "serve", "--addr", "0.0.0.0:8080", "--sweep-interval", "15m"]).unwrap();
        match cli.command {
            Commands::Serve { addr, sweep_interval } => {
                assert_eq!(addr.port(), 8080);
                assert_eq!(sweep_interval.0, Duration::from_secs(900));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["nq", "ask"]).is_err());
    }

    #[test]
    fn test_delete_args() {
        let cli = Cli::try_parse_from(["nq", "--storage", "sqlite", "delete", "https://a.com", "https://b.com/x"]).unwrap();
        match cli.command {
            Commands::Delete { urls } => assert_eq!(urls, vec!["https://a.com", "https://b.com/x"]),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["nq", "delete"]).is_err());
    }
}
