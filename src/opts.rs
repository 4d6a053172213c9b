//! CLI options.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser};

pub mod parsers;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Opts {
    /// Sentry DSN
    #[arg(short, long, env = "SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance monitoring sample rate for Sentry
    #[arg(long, default_value = "0", env = "SENTRY_TRACES_SAMPLE_RATE")]
    pub traces_sample_rate: f32,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
pub enum Subcommand {
    Train(TrainOpts),
    Serve(ServeOpts),
}

#[derive(Args, Clone)]
pub struct ModelOpts {
    /// Model artifact path
    #[arg(long = "model-path", default_value = "iris_model.pickle")]
    pub path: PathBuf,
}

/// Fits the classifier on the Iris dataset and saves the model artifact
#[derive(Args)]
pub struct TrainOpts {
    #[command(flatten)]
    pub model: ModelOpts,

    /// Split random seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Fraction of every class held out for the evaluation
    #[arg(long, default_value = "0.2", value_parser = parsers::fraction)]
    pub test_ratio: f64,

    /// Optimiser iteration limit
    #[arg(long, default_value = "200", value_parser = parsers::non_zero_u64)]
    pub max_iterations: u64,
}

/// Loads the model artifact and serves the predictions
#[derive(Args)]
pub struct ServeOpts {
    #[command(flatten)]
    pub model: ModelOpts,

    /// Web application bind host
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Web application bind port
    #[arg(short, long, default_value = "5000")]
    pub port: u16,

    /// Log every request and response
    #[arg(long)]
    pub debug: bool,
}
