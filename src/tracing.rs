use std::borrow::Cow;
use std::time::Duration as StdDuration;

use sentry::integrations::tracing::EventFilter;
use sentry::{ClientInitGuard, ClientOptions};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::prelude::*;

/// Initialises tracing: console output and, when the DSN is set, Sentry events.
pub fn init(sentry_dsn: Option<String>, traces_sample_rate: f32) -> Result<ClientInitGuard> {
    let guard = sentry::init((
        sentry_dsn,
        ClientOptions {
            release: Some(Cow::Borrowed(env!("CARGO_PKG_VERSION"))),
            traces_sample_rate,
            ..Default::default()
        },
    ));

    // Only the failures are reported, everything else travels along as breadcrumbs.
    let sentry_layer = sentry::integrations::tracing::layer()
        .event_filter(|metadata| match metadata.level() {
            &Level::ERROR | &Level::WARN => EventFilter::Event,
            _ => EventFilter::Breadcrumb,
        })
        .with_filter(filter_from_env("IRIS_SERVICE_SENTRY_LOG", "iris_service=debug")?);

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(filter_from_env("IRIS_SERVICE_LOG", "iris_service=info,poem=info")?);

    tracing_subscriber::Registry::default()
        .with(sentry_layer)
        .with(format_layer)
        .init();

    Ok(guard)
}

fn filter_from_env(key: &str, default: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_env(key)
        .or_else(|_| EnvFilter::try_new(default))
        .with_context(|| format!("invalid `{}` filter", key))
}

pub fn format_duration(duration: StdDuration) -> String {
    humantime::format_duration(duration).to_string()
}

pub fn format_elapsed(instant: Instant) -> String {
    format_duration(instant.elapsed())
}
