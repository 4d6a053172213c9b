use poem::endpoint::BoxEndpoint;
use poem::listener::TcpListener;
use poem::middleware::{CatchPanic, Tracing};
use poem::{post, EndpointExt, Route, Server};

use crate::model::Classifier;
use crate::opts::ServeOpts;
use crate::prelude::*;
use crate::web::middleware::{
    ErrorMiddleware, SecurityHeadersMiddleware, SentryMiddleware, TimeItMiddleware,
};
use crate::web::views::predict::post_predict;

mod middleware;
mod responses;
mod views;


/// Loads the model and serves the predictions until the process is stopped.
/// A missing or corrupt model aborts the startup before the port is bound.
#[instrument(skip_all, fields(host = ?opts.host, port = opts.port))]
pub async fn run(opts: &ServeOpts) -> Result {
    info!(path = ?opts.model.path, "loading the model…");
    let classifier = Classifier::load(&opts.model.path).with_context(|| {
        format!(
            "failed to load the model from `{}`, run `train` first",
            opts.model.path.display(),
        )
    })?;

    let app = create_app(Arc::new(classifier), opts.debug);
    info!(debug = opts.debug, "listening on {}:{}…", opts.host, opts.port);
    Server::new(TcpListener::bind((opts.host, opts.port)))
        .run(app)
        .await
        .context("the web server has failed")?;
    Ok(())
}

/// Builds the application around the already loaded model.
pub fn create_app(classifier: Arc<Classifier>, debug: bool) -> BoxEndpoint<'static> {
    let app = Route::new()
        .at("/predict", post(post_predict))
        .data(classifier)
        .with(CatchPanic::new())
        .with(ErrorMiddleware)
        .with(TimeItMiddleware)
        .with(SecurityHeadersMiddleware)
        .with(SentryMiddleware);
    if debug {
        app.with(Tracing).boxed()
    } else {
        app.boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::path::PathBuf;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::opts::ModelOpts;

    fn serve_opts(path: PathBuf) -> ServeOpts {
        ServeOpts {
            model: ModelOpts { path },
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            debug: false,
        }
    }

    #[tokio::test]
    async fn missing_model_refuses_to_start() -> Result {
        let directory = tempfile::tempdir()?;
        let opts = serve_opts(directory.path().join("missing.pickle"));
        let result = timeout(Duration::from_secs(5), run(&opts)).await?;
        let error = result.unwrap_err();
        assert!(format!("{:#}", error).contains("failed to load the model"), "{:#}", error);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_model_refuses_to_start() -> Result {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("iris_model.pickle");
        std::fs::write(&path, b"not a model")?;
        let result = timeout(Duration::from_secs(5), run(&serve_opts(path))).await?;
        assert!(result.is_err());
        Ok(())
    }
}
