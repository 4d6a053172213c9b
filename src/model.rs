//! Fitted linear classifier and its on-disk artifact.
//!
//! The artifact is the only contract between the trainer and the web application:
//! it carries the feature order, the parameters and the class labels, so that
//! a loaded model predicts exactly what the trainer evaluated.

use std::fs;
use std::path::Path;

use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use serde_pickle::{DeOptions, SerOptions};

use crate::prelude::*;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Classifier {
    /// Ordered feature names, one per coefficient row.
    pub feature_names: Vec<String>,

    /// Human-readable class names, aligned with [`Classifier::classes`].
    pub target_names: Vec<String>,

    /// Class labels in ascending order, one per coefficient column.
    pub classes: Vec<usize>,

    /// Weights, `n_features × n_classes`.
    pub coefficients: Array2<f64>,

    pub intercept: Array1<f64>,
}

impl Classifier {
    pub fn new(
        feature_names: Vec<String>,
        target_names: Vec<String>,
        classes: Vec<usize>,
        coefficients: Array2<f64>,
        intercept: Array1<f64>,
    ) -> Result<Self> {
        let this = Self {
            feature_names,
            target_names,
            classes,
            coefficients,
            intercept,
        };
        this.validate()?;
        Ok(this)
    }

    /// Number of features the model expects in every row.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Predicts the class label for every row of the feature matrix.
    pub fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<usize>> {
        if features.ncols() != self.n_features() {
            bail!("expected {} features, got {}", self.n_features(), features.ncols());
        }
        let scores = features.dot(&self.coefficients) + &self.intercept;
        scores
            .rows()
            .into_iter()
            .map(|row| {
                // Overflowing inputs still get a class: `total_cmp` orders infinities and NaNs.
                let (index, _) = row
                    .iter()
                    .copied()
                    .enumerate()
                    .max_by(|(_, lhs), (_, rhs)| lhs.total_cmp(rhs))
                    .ok_or_else(|| anyhow!("the model has no classes"))?;
                Ok(self.classes[index])
            })
            .collect()
    }

    /// Reshapes the feature vector into a single row and predicts its class label.
    pub fn predict_one(&self, features: &[f64]) -> Result<usize> {
        let row = ArrayView2::from_shape((1, features.len()), features)?;
        self.predict(row)?
            .get(0)
            .copied()
            .ok_or_else(|| anyhow!("the model returned no prediction"))
    }

    #[instrument(level = "info", skip_all, fields(path = ?path.as_ref()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result {
        let buffer = serde_pickle::to_vec(self, SerOptions::new())
            .context("failed to serialize the model")?;
        fs::write(path.as_ref(), buffer).context("failed to write the model artifact")?;
        info!(n_features = self.n_features(), n_classes = self.classes.len(), "saved");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(path = ?path.as_ref()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let buffer = fs::read(path.as_ref()).context("failed to read the model artifact")?;
        let this: Self = serde_pickle::from_slice(&buffer, DeOptions::new())
            .context("failed to deserialize the model")?;
        this.validate().context("the model artifact is corrupt")?;
        info!(n_features = this.n_features(), n_classes = this.classes.len(), "loaded");
        Ok(this)
    }

    fn validate(&self) -> Result {
        let (n_features, n_classes) = self.coefficients.dim();
        if n_features == 0 || n_classes == 0 {
            bail!("empty coefficient matrix");
        }
        if self.feature_names.len() != n_features {
            bail!("{} feature names for {} features", self.feature_names.len(), n_features);
        }
        if self.intercept.len() != n_classes || self.classes.len() != n_classes {
            bail!(
                "{} classes and {} intercepts for {} coefficient columns",
                self.classes.len(),
                self.intercept.len(),
                n_classes,
            );
        }
        if !self.target_names.is_empty() && self.target_names.len() != n_classes {
            bail!("{} target names for {} classes", self.target_names.len(), n_classes);
        }
        if !self.classes.iter().tuple_windows().all(|(lhs, rhs)| lhs < rhs) {
            bail!("class labels must be strictly ascending");
        }
        Ok(())
    }
}
