//! Command-line front end: query or evaluate a recommender built from a CSV.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::info;

use postrec::dataset::Dataset;
use postrec::evaluation::evaluate;
use postrec::service::DatasetSource;
use postrec::{FeedQuery, RecommendationService, RecommenderBuilder, RecommenderConfig};

#[derive(Parser, Debug)]
#[command(name = "postrec", version, about = "Hybrid post recommender")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Common {
    #[arg(long, value_name = "FILE", help = "Merged interactions CSV")]
    data: PathBuf,

    #[arg(long, value_name = "FILE", help = "TOML recommender config")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the feed reply for one user as JSON.
    Recommend {
        #[command(flatten)]
        common: Common,
        #[arg(long)]
        username: String,
        #[arg(long)]
        category_id: Option<i64>,
        #[arg(long)]
        mood: Option<String>,
    },
    /// Print Precision@K, Recall@K, MRR and NDCG@K over all users.
    Evaluate {
        #[command(flatten)]
        common: Common,
        #[arg(long, default_value_t = 5)]
        k: usize,
        #[arg(long)]
        alpha: Option<f64>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<RecommenderConfig, Box<dyn Error>> {
    Ok(match path {
        Some(p) => RecommenderConfig::load(p)?,
        None => RecommenderConfig::default(),
    })
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    match cli.command {
        Command::Recommend {
            common,
            username,
            category_id,
            mood,
        } => {
            let config = load_config(common.config.as_ref())?;
            let service = RecommendationService::start(DatasetSource::Csv(common.data), config)?;
            let query = FeedQuery {
                username,
                category_id,
                mood,
            };
            let reply = service.feed(&query);
            eprintln!("status: {}", reply.status);
            println!("{}", reply.to_json()?);
            Ok(if reply.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Evaluate { common, k, alpha } => {
            let config = load_config(common.config.as_ref())?;
            let alpha = alpha.unwrap_or(config.default_alpha);
            let dataset = Arc::new(Dataset::load_csv(&common.data)?);
            info!("Loaded {} rows from {}", dataset.len(), common.data.display());
            let model = RecommenderBuilder::from_config(config).build(dataset)?;
            let report = evaluate(&model, k, alpha)?;
            println!("Evaluation Metrics:");
            println!("Precision@K: {:.4}", report.precision_at_k);
            println!("Recall@K: {:.4}", report.recall_at_k);
            println!("MRR: {:.4}", report.mrr);
            println!("NDCG@K: {:.4}", report.ndcg_at_k);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
