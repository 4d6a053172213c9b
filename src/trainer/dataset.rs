use std::collections::BTreeMap;

use linfa::Dataset;
use ndarray::{Axis, Ix1};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::prelude::*;

pub const FEATURE_NAMES: [&str; 4] = [
    "sepal length (cm)",
    "sepal width (cm)",
    "petal length (cm)",
    "petal width (cm)",
];

pub const TARGET_NAMES: [&str; 3] = ["setosa", "versicolor", "virginica"];

pub type Iris = Dataset<f64, usize, Ix1>;

/// Loads the bundled Iris dataset: 150 records, 4 features, 3 classes.
#[instrument(level = "debug")]
pub fn load() -> Iris {
    linfa_datasets::iris()
}

/// Splits the dataset so that every class contributes the same fraction of its records
/// to the test set. The same seed always produces the same split.
#[instrument(level = "debug", skip(dataset))]
pub fn stratified_split(dataset: &Iris, test_ratio: f64, seed: u64) -> Result<(Iris, Iris)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        bail!("test ratio {} is not within (0, 1)", test_ratio);
    }

    let mut classes = BTreeMap::<usize, Vec<usize>>::new();
    for (index, label) in dataset.targets().iter().enumerate() {
        classes.entry(*label).or_default().push(index);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();
    for (label, mut indices) in classes {
        indices.shuffle(&mut rng);
        // Every class keeps at least one record for the training.
        let n_test = ((indices.len() as f64 * test_ratio).round() as usize).min(indices.len() - 1);
        debug!(label, n_records = indices.len(), n_test);
        test_indices.extend_from_slice(&indices[..n_test]);
        train_indices.extend_from_slice(&indices[n_test..]);
    }
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok((select(dataset, &train_indices), select(dataset, &test_indices)))
}

fn select(dataset: &Iris, indices: &[usize]) -> Iris {
    Dataset::new(
        dataset.records().select(Axis(0), indices),
        dataset.targets().select(Axis(0), indices),
    )
}
