use clap::Parser;
use tokio::task::spawn_blocking;

use crate::opts::{Opts, Subcommand};
use crate::prelude::*;

mod model;
mod opts;
mod prelude;
mod tracing;
mod trainer;
mod web;

#[tokio::main]
async fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard = tracing::init(opts.sentry_dsn.clone(), opts.traces_sample_rate)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting up…");

    let result = match opts.subcommand {
        Subcommand::Train(opts) => spawn_blocking(move || trainer::run(&opts)).await?,
        Subcommand::Serve(opts) => web::run(&opts).await,
    };
    if let Err(error) = &result {
        error!("{:#}", error);
    }
    result
}
