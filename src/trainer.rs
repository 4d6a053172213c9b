//! Fits a multinomial logistic regression on the Iris dataset
//! and saves it as the model artifact for the web application.

use itertools::Itertools;
use linfa::prelude::{Fit, Records, ToConfusionMatrix};
use linfa_logistic::MultiLogisticRegression;

use crate::model::Classifier;
use crate::opts::TrainOpts;
use crate::prelude::*;
use crate::tracing::format_elapsed;
use crate::trainer::dataset::{Iris, FEATURE_NAMES, TARGET_NAMES};

pub mod dataset;

#[instrument(skip_all)]
pub fn run(opts: &TrainOpts) -> Result {
    let start_instant = Instant::now();

    info!("loading the dataset…");
    let dataset = dataset::load();

    info!(n_records = dataset.nsamples(), opts.test_ratio, opts.seed, "splitting…");
    let (train, test) = dataset::stratified_split(&dataset, opts.test_ratio, opts.seed)?;

    info!(n_train = train.nsamples(), opts.max_iterations, "training…");
    let classifier = fit(&train, opts.max_iterations)?;

    info!(n_test = test.nsamples(), "evaluating…");
    let accuracy = evaluate(&classifier, &test)?;
    info!(accuracy = format!("{:.4}", accuracy).as_str(), "evaluated");
    println!("Test set accuracy: {:.4}", accuracy);

    info!(path = ?opts.model.path, "saving…");
    classifier.save(&opts.model.path)?;

    info!(elapsed = format_elapsed(start_instant).as_str(), "done");
    Ok(())
}

/// Fits the classifier and copies the fitted parameters into the artifact.
#[instrument(level = "debug", skip(train))]
pub fn fit(train: &Iris, max_iterations: u64) -> Result<Classifier> {
    let fitted = MultiLogisticRegression::default()
        .max_iterations(max_iterations)
        .fit(train)
        .context("failed to fit the logistic regression")?;
    let classes = train.targets().iter().copied().sorted_unstable().dedup().collect_vec();
    let target_names = classes
        .iter()
        .map(|label| match TARGET_NAMES.get(*label) {
            Some(name) => name.to_string(),
            None => label.to_string(),
        })
        .collect();
    Classifier::new(
        FEATURE_NAMES.iter().map(ToString::to_string).collect(),
        target_names,
        classes,
        fitted.params().to_owned(),
        fitted.intercept().to_owned(),
    )
}

/// Returns the accuracy of the classifier on the dataset.
pub fn evaluate(classifier: &Classifier, dataset: &Iris) -> Result<f64> {
    let predictions = classifier.predict(dataset.records().view())?;
    let confusion_matrix = predictions
        .confusion_matrix(dataset)
        .context("failed to build the confusion matrix")?;
    debug!(?confusion_matrix);
    Ok(f64::from(confusion_matrix.accuracy()))
}
