//! Classifier artifacts: logistic regression and tree ensembles.
//!
//! The offline exporter writes one of these as `model.json`, tagged by
//! `kind`. Trees use a flat pre-order node array: a split's children always
//! sit at larger indices than the split, which validation enforces so
//! traversal always terminates.

use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::domain::Classification;
use crate::ports::Classifier;

/// Exported linear model: `p = sigmoid(w . x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// One node of an exported decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes left, otherwise right.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class-1 probability at this leaf.
    Leaf { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

/// Probability is the mean of the trees' leaf probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<Vec<TreeNode>>,
}

/// Any classifier the exporter can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl ClassifierModel {
    /// Sanity-check the exported parameters.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            Self::LogisticRegression(m) => {
                if m.coefficients.is_empty() {
                    return Err(ArtifactError::Invalid(
                        "logistic regression has no coefficients".into(),
                    ));
                }
                if !m.intercept.is_finite() || m.coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ArtifactError::Invalid(
                        "logistic regression has non-finite parameters".into(),
                    ));
                }
                Ok(())
            }
            Self::DecisionTree(m) => validate_tree(&m.nodes, m.n_features)
                .map_err(|e| ArtifactError::Invalid(format!("decision tree: {e}"))),
            Self::RandomForest(m) => {
                if m.trees.is_empty() {
                    return Err(ArtifactError::Invalid("random forest has no trees".into()));
                }
                for (i, tree) in m.trees.iter().enumerate() {
                    validate_tree(tree, m.n_features)
                        .map_err(|e| ArtifactError::Invalid(format!("tree {i}: {e}")))?;
                }
                Ok(())
            }
        }
    }
}

impl Classifier for ClassifierModel {
    fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::DecisionTree(_) => "decision_tree",
            Self::RandomForest(_) => "random_forest",
        }
    }

    fn num_features(&self) -> usize {
        match self {
            Self::LogisticRegression(m) => m.coefficients.len(),
            Self::DecisionTree(m) => m.n_features,
            Self::RandomForest(m) => m.n_features,
        }
    }

    fn classify(&self, scaled: &[f64]) -> Classification {
        let probability = match self {
            Self::LogisticRegression(m) => {
                let logit = m
                    .coefficients
                    .iter()
                    .zip(scaled)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + m.intercept;
                sigmoid(logit)
            }
            Self::DecisionTree(m) => tree_probability(&m.nodes, scaled),
            Self::RandomForest(m) => {
                m.trees
                    .iter()
                    .map(|t| tree_probability(t, scaled))
                    .sum::<f64>()
                    / m.trees.len() as f64
            }
        };
        Classification::from_probability(probability)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn validate_tree(nodes: &[TreeNode], n_features: usize) -> Result<(), String> {
    if nodes.is_empty() {
        return Err("no nodes".into());
    }
    for (i, node) in nodes.iter().enumerate() {
        match *node {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if feature >= n_features {
                    return Err(format!("node {i} splits on feature {feature} of {n_features}"));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {i} has non-finite threshold"));
                }
                if left <= i || right <= i || left >= nodes.len() || right >= nodes.len() {
                    return Err(format!("node {i} has invalid children ({left}, {right})"));
                }
            }
            TreeNode::Leaf { value } => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(format!("leaf {i} probability {value} outside [0, 1]"));
                }
            }
        }
    }
    Ok(())
}

// Assumes `validate_tree` passed: children are in bounds and strictly after
// their parent.
fn tree_probability(nodes: &[TreeNode], x: &[f64]) -> f64 {
    let mut idx = 0;
    loop {
        match nodes[idx] {
            TreeNode::Leaf { value } => return value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                idx = if x[feature] <= threshold { left } else { right };
            }
        }
    }
}
