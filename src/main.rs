use clap::Parser;
use pipeline::{Pipeline, RunOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trendcast_core::{clamp_topic_count, AppConfig, ErrorExt};

const EXIT_INTERRUPTED: u8 = 130;
const DEFAULT_LOG_FILTER: &str = "warn,trendcast=info,trendcast_core=info,forum_client=info,\
llm_interface=info,illustrator=info,publisher=info,pipeline=info";

/// Collects trending AI discussions, distills them with Claude, illustrates
/// the top topics and publishes a Markdown note and an HTML page.
#[derive(Debug, Parser)]
#[command(name = "trendcast", version, about)]
struct Args {
    /// Skip image generation
    #[arg(long)]
    skip_images: bool,

    /// Use built-in sample posts instead of collecting from the forum
    #[arg(long)]
    skip_forum: bool,

    /// Use the forum API instead of scraping (needs REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET)
    #[arg(long)]
    forum_api: bool,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for the note, page and images
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Number of topics to extract (1-50)
    #[arg(long, value_name = "N")]
    topics: Option<usize>,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            skip_images: self.skip_images,
            skip_forum: self.skip_forum,
            use_forum_api: self.forum_api,
        }
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(count) = self.topics {
            config.top_topics_count = clamp_topic_count(count);
        }
    }
}

fn print_banner() {
    println!();
    println!("  trendcast {}", env!("CARGO_PKG_VERSION"));
    println!("  AI community trends, summarized and illustrated");
    println!();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    print_banner();

    let mut config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            e.log_error();
            eprintln!("Error [{}]: {}", e.error_code(), e.user_friendly_message());
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);
    config.log_redacted();

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            e.log_error();
            eprintln!("Error [{}]: {}", e.error_code(), e.user_friendly_message());
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        result = pipeline.run(args.run_options()) => match result {
            Ok(report) => {
                println!("\nPipeline complete\n\n{}", report);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Pipeline failed: {:?}", e);
                eprintln!("\nPipeline failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, stopping");
            eprintln!("\nPipeline interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "trendcast",
            "--skip-images",
            "--forum-api",
            "--output-dir",
            "site",
            "--topics",
            "80",
        ]);
        let options = args.run_options();
        assert!(options.skip_images);
        assert!(!options.skip_forum);
        assert!(options.use_forum_api);

        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.output.dir, PathBuf::from("site"));
        assert_eq!(config.top_topics_count, 50);
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let args = Args::parse_from(["trendcast"]);
        assert_eq!(args.run_options(), RunOptions::default());

        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.output.dir, PathBuf::from("output"));
        assert_eq!(config.top_topics_count, 10);
    }
}
