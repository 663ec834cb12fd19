use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;

use issue_labeler::{
    cross_validate, load_issues, web, AverageMetrics, ClassifierBuilder, GithubIssue,
    IssueLabeler, ModelManager, TrainerOptions, DEFAULT_MODEL_PATH,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train on a labeled TSV file, save the model and print cross-validation results
    Train(TrainArgs),
    /// Serve the issue form
    Serve(ServeArgs),
    /// Predict the area of a single issue
    Predict(PredictArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Tab-separated training data with Area, Title and Description columns
    #[arg(long, default_value = "Data/corefx-issues-train.tsv")]
    data: PathBuf,
    /// Where to write the trained model
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
    /// Number of cross-validation folds
    #[arg(long, default_value_t = 5)]
    folds: usize,
    /// Seed for shuffling during training and fold assignment
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// L2 regularization strength
    #[arg(long)]
    l2: Option<f32>,
    /// Maximum number of SDCA epochs
    #[arg(long)]
    max_epochs: Option<usize>,
}

#[derive(Args)]
struct ServeArgs {
    /// Trained model to serve
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
    /// Serve the form without loading a model; submissions show no prediction
    #[arg(long)]
    starter: bool,
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
}

fn train(args: TrainArgs) -> anyhow::Result<()> {
    let start_time = Instant::now();
    info!("=== Training issue classifier ===");

    let issues = load_issues(&args.data)
        .with_context(|| format!("Failed to load training data from {:?}", args.data))?;

    let defaults = TrainerOptions::default();
    let builder = ClassifierBuilder::new().with_trainer_options(TrainerOptions {
        l2_regularization: args.l2.unwrap_or(defaults.l2_regularization),
        max_epochs: args.max_epochs.unwrap_or(defaults.max_epochs),
        seed: args.seed,
        ..defaults
    });

    let classifier = builder.fit(&issues).context("Failed to train the classifier")?;
    let info = classifier.info();
    info!(
        "Trained on {} issues: {} areas, {} features, {} epochs",
        issues.len(),
        info.num_classes,
        info.num_features,
        info.training.epochs
    );

    let manager = ModelManager::new(&args.model);
    manager
        .save(&classifier)
        .with_context(|| format!("Failed to save the model to {:?}", args.model))?;
    println!("Model saved to {}", args.model.display());

    let results = cross_validate(&builder, &issues, args.folds).context("Cross-validation failed")?;
    for result in &results {
        println!("Fold {}", result.fold + 1);
        println!("{}", result.metrics.confusion_matrix.formatted_confusion_table());
    }

    let average = AverageMetrics::from_results(&results);
    println!("Micro accuracy:      {:.4}", average.micro_accuracy);
    println!("Macro accuracy:      {:.4}", average.macro_accuracy);
    println!("Log loss:            {:.4}", average.log_loss);
    println!("Log loss reduction:  {:.4}", average.log_loss_reduction);

    info!("=== Training complete (took {:.2?}) ===", start_time.elapsed());
    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = web::ServerConfig {
        bind_addr: args.bind,
        model_path: (!args.starter).then_some(args.model),
    };

    let state = match &config.model_path {
        Some(path) => {
            let labeler = IssueLabeler::load(path)
                .with_context(|| format!("Failed to load the model from {:?}", path))?;
            web::AppState::new(labeler)
        }
        None => web::AppState::starter(),
    };

    web::serve(state, config.bind_addr)
        .await
        .context("Web server failed")
}

fn predict(args: PredictArgs) -> anyhow::Result<()> {
    let labeler = IssueLabeler::load(&args.model)
        .with_context(|| format!("Failed to load the model from {:?}", args.model))?;
    let prediction = labeler.predict_label(&GithubIssue::new(args.title, args.description))?;

    println!("Predicted area: {}", prediction.area);
    let mut scores: Vec<_> = labeler.labels().iter().zip(&prediction.score).collect();
    scores.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (label, score) in scores {
        println!("  {}: {:.1}%", label, score * 100.0);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    issue_labeler::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Command::Train(args) => train(args),
        Command::Serve(args) => serve(args).await,
        Command::Predict(args) => predict(args),
    }
}
