pub mod sample;


pub use sample::{sample_digest, SAMPLE_POST_COUNT};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use forum_client::ForumClient;
use illustrator::Illustrator;
use llm_interface::{ClaudeProvider, InsightExtractor, LlmProvider, PromptSynthesizer};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use trendcast_core::{posts_to_digest, AppConfig, CoreError, Topic};

/// Switches taken from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Leave topics without images and skip the illustrator entirely.
    pub skip_images: bool,
    /// Use the built-in sample digest instead of collecting posts.
    pub skip_forum: bool,
    /// Prefer the authenticated forum API over scraping.
    pub use_forum_api: bool,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub posts_collected: usize,
    pub topics: Vec<Topic>,
    pub images_generated: usize,
    pub elapsed: Duration,
    pub markdown_path: PathBuf,
    pub html_path: PathBuf,
    pub images_dir: PathBuf,
}

impl PipelineReport {
    pub fn topics_extracted(&self) -> usize {
        self.topics.len()
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Posts collected:  {}", self.posts_collected)?;
        writeln!(f, "  Topics extracted: {}", self.topics_extracted())?;
        writeln!(f, "  Images generated: {}", self.images_generated)?;
        writeln!(f, "  Time elapsed:     {}s", self.elapsed.as_secs())?;
        writeln!(f)?;
        writeln!(f, "Output files:")?;
        writeln!(f, "  Markdown: {}", self.markdown_path.display())?;
        writeln!(f, "  HTML:     {}", self.html_path.display())?;
        write!(f, "  Images:   {}", self.images_dir.display())
    }
}

/// Drives one run from collection through publishing.
pub struct Pipeline<P: LlmProvider = ClaudeProvider> {
    config: AppConfig,
    provider: P,
}

impl Pipeline<ClaudeProvider> {
    /// Fails before any network activity when the LLM key is missing.
    pub fn new(config: AppConfig) -> Result<Self, CoreError> {
        let api_key = config.require_llm_key()?;
        let provider = ClaudeProvider::new(api_key, &config.llm)?;
        Ok(Self::with_provider(config, provider))
    }
}

impl<P: LlmProvider> Pipeline<P> {
    pub fn with_provider(config: AppConfig, provider: P) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// True when images will be generated but only placeholders can be drawn.
    pub fn placeholders_only(&self, options: RunOptions) -> bool {
        !options.skip_images && self.config.credentials.replicate_api_token.is_none()
    }

    pub async fn run(&self, options: RunOptions) -> Result<PipelineReport> {
        self.run_on(options, Local::now().date_naive()).await
    }

    /// Runs every step in order. The first error aborts the rest; files
    /// written by earlier steps stay on disk.
    pub async fn run_on(&self, options: RunOptions, date: NaiveDate) -> Result<PipelineReport> {
        let started = Instant::now();
        let output = &self.config.output;
        let images_dir = output.images_dir();

        step(1, "Collecting posts");
        let (digest, posts_collected) = self
            .collect(options)
            .await
            .context("Failed to collect posts")?;
        info!("Collected {} posts", posts_collected);

        step(2, "Summarizing trends");
        let insight = InsightExtractor::new(&self.provider, &self.config.llm);
        let summary = insight
            .summarize(&digest)
            .await
            .context("Failed to generate summary")?;

        step(3, "Extracting topics");
        let mut topics = insight
            .extract_topics(&digest, self.config.top_topics_count)
            .await
            .context("Failed to extract topics")?;
        for (i, topic) in topics.iter().enumerate() {
            info!("  {}. {} ({}/10)", i + 1, topic.title, topic.importance);
        }

        step(4, "Generating image prompts");
        PromptSynthesizer::new(&self.provider, &self.config.llm)
            .synthesize(&mut topics)
            .await;

        step(5, "Generating images");
        let images_generated = if options.skip_images {
            info!("Skipping image generation");
            topics.iter_mut().for_each(Topic::clear_image);
            0
        } else {
            if self.placeholders_only(options) {
                warn!("REPLICATE_API_TOKEN not set, images will be placeholders");
            }
            let illustrator = Illustrator::new(&self.config.images, &self.config.credentials)
                .context("Failed to initialize image generation")?;
            illustrator
                .illustrate_topics(&mut topics, &images_dir)
                .await
                .context("Failed to generate images")?
        };

        step(6, "Writing Markdown note");
        let markdown_path = publisher::write_markdown(
            &topics,
            &summary,
            &output.markdown_path(),
            &images_dir,
            date,
        )
        .context("Failed to write Markdown note")?;

        step(7, "Writing HTML page");
        let html_path =
            publisher::write_html(&topics, &summary, &output.html_path(), &images_dir, date)
                .context("Failed to write HTML page")?;

        Ok(PipelineReport {
            posts_collected,
            topics,
            images_generated,
            elapsed: started.elapsed(),
            markdown_path,
            html_path,
            images_dir,
        })
    }

    async fn collect(&self, options: RunOptions) -> Result<(String, usize), CoreError> {
        if options.skip_forum {
            info!("Skipping forum collection, using sample data");
            return Ok((sample_digest(), SAMPLE_POST_COUNT));
        }

        let client = ForumClient::new(self.config.forum.clone(), &self.config.credentials)?;
        let posts = client.collect(options.use_forum_api).await;
        Ok((posts_to_digest(&posts), posts.len()))
    }
}

fn step(number: u8, title: &str) {
    info!("STEP {}: {}", number, title);
}
