use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::DeepSeek;
use carrot_common::AppConfig;
use carrot_discovery::store::{MemoryFrontier, MemoryPlanStore};
use carrot_discovery::{
    extract_fair_use_quote, validate_planner_plan, Planner, PlannerOptions, VetInput, Vetter,
};

#[derive(Parser)]
#[command(
    name = "carrot-discovery",
    about = "Discovery planner, source vetter and quote extractor"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a topic and print the plan plus the frontier items it produced
    Plan {
        #[arg(long)]
        topic: String,
        #[arg(long = "alias")]
        aliases: Vec<String>,
        #[arg(long, default_value = "local")]
        patch: String,
        /// Defaults to a fresh UUID
        #[arg(long)]
        run: Option<String>,
    },
    /// Vet the text of one fetched page
    Vet {
        #[arg(long)]
        topic: String,
        #[arg(long = "alias")]
        aliases: Vec<String>,
        #[arg(long)]
        url: String,
        /// File holding the cleaned page text
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "claim")]
        claims: Vec<String>,
    },
    /// Extract the fair-use quote from an article
    Quote {
        #[arg(long)]
        html: PathBuf,
        /// Plain-text rendition; defaults to the HTML file itself
        #[arg(long)]
        text: Option<PathBuf>,
    },
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("carrot=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    config.log_redacted();

    match cli.command {
        Command::Plan {
            topic,
            aliases,
            patch,
            run,
        } => {
            let api_key = config.deepseek_api_key.clone().unwrap_or_else(|| {
                warn!("DEEPSEEK_API_KEY not set, planner will use the fallback plan");
                String::new()
            });
            let deepseek = DeepSeek::new(api_key, config.planner_model.clone())
                .with_base_url(config.deepseek_base_url.clone());

            let frontier = Arc::new(MemoryFrontier::new());
            let plans = Arc::new(MemoryPlanStore::new());
            let planner = Planner::builder()
                .completion(Arc::new(deepseek))
                .frontier(frontier.clone())
                .plans(plans.clone())
                .options(PlannerOptions::from_config(&config))
                .build();

            let run_id = run.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let started = Utc::now();
            let plan = planner
                .generate_discovery_plan(&topic, &aliases, &patch, &run_id)
                .await?;
            info!(
                run_id = run_id.as_str(),
                elapsed_ms = (Utc::now() - started).num_milliseconds(),
                "Planning finished"
            );

            let output = serde_json::json!({
                "runId": run_id,
                "plan": plan,
                "validation": validate_planner_plan(&plan),
                "frontier": frontier.by_priority(&patch),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Vet {
            topic,
            aliases,
            url,
            file,
            claims,
        } => {
            let vetter = Vetter::from_config(&config)?;
            let input = VetInput {
                topic,
                aliases,
                url,
                text: read(&file)?,
                contested_claims: claims,
            };
            let result = vetter.vet_source(&input).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Quote { html, text } => {
            let article_html = read(&html)?;
            let article_text = match &text {
                Some(path) => read(path)?,
                None => article_html.clone(),
            };
            match extract_fair_use_quote(&article_html, &article_text) {
                Some(quote) => println!("{}", serde_json::to_string_pretty(&quote)?),
                None => warn!("Article too short for a fair-use quote"),
            }
        }
    }

    Ok(())
}
