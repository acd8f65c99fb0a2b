//! Gradient-boosted regression tree inference.
//!
//! Models are read from the JSON tree dump produced by XGBoost
//! (`Booster.get_dump(dump_format="json")`) wrapped with the booster's base
//! score. Only the squared-error objective is supported: the prediction is
//! the base score plus the sum of one leaf value per tree.

use crate::core::artifact::{check_feature_names, read_json, ArtifactError};
use crate::core::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::Path;

/// Maps a scaled feature vector to a base risk value.
pub trait RiskModel {
    fn predict(&self, scaled: &FeatureVector) -> f64;
}

/// A node as written by the XGBoost JSON dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpNode {
    pub nodeid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_condition: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DumpNode>,
}

/// On-disk model format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub base_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<DumpNode>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        missing: usize,
    },
}

/// A single regression tree in flat form; index 0 is the root.
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn eval(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let v = x[feature];
                    i = if v.is_nan() {
                        missing
                    } else if v < threshold {
                        yes
                    } else {
                        no
                    };
                }
            }
        }
    }
}

/// Additive ensemble of regression trees.
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    base_score: f64,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Build from a parsed artifact, validating every tree.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self, ArtifactError> {
        check_feature_names(artifact.feature_names.as_deref())?;

        if !artifact.base_score.is_finite() {
            return Err(ArtifactError::Shape(format!(
                "base_score must be finite, got {}",
                artifact.base_score
            )));
        }
        if artifact.trees.is_empty() {
            return Err(ArtifactError::Shape("model has no trees".to_string()));
        }

        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(i, root)| flatten(i, root))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            base_score: artifact.base_score,
            trees,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact =
            serde_json::from_str(json).map_err(|e| ArtifactError::Parse {
                path: None,
                message: e.to_string(),
            })?;
        Self::from_artifact(&artifact)
    }

    /// Load a model artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = read_json(path)?;
        let model = Self::from_artifact(&artifact)?;
        tracing::info!(
            "Loaded model from {:?} ({} trees, base score {})",
            path,
            model.tree_count(),
            model.base_score
        );
        Ok(model)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl RiskModel for TreeEnsemble {
    fn predict(&self, scaled: &FeatureVector) -> f64 {
        let x = scaled.as_slice();
        self.base_score + self.trees.iter().map(|t| t.eval(x)).sum::<f64>()
    }
}

/// Resolve a split name, either `f<index>` or a training feature name.
fn resolve_feature(split: &str) -> Option<usize> {
    if let Some(i) = FEATURE_NAMES.iter().position(|n| *n == split) {
        return Some(i);
    }
    split
        .strip_prefix('f')
        .and_then(|idx| idx.parse::<usize>().ok())
        .filter(|&i| i < FEATURE_COUNT)
}

/// Convert a nested dump tree into flat form.
///
/// Every node must be reachable from the root through exactly one parent,
/// which rules out cycles and shared subtrees.
fn flatten(tree: usize, root: &DumpNode) -> Result<Tree, ArtifactError> {
    let invalid = |message: String| ArtifactError::InvalidTree { tree, message };

    let mut by_id: HashMap<u32, &DumpNode> = HashMap::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if by_id.insert(node.nodeid, node).is_some() {
            return Err(invalid(format!("duplicate node id {}", node.nodeid)));
        }
        stack.extend(node.children.iter());
    }

    let mut index_of: HashMap<u32, usize> = HashMap::new();
    let mut order: Vec<u32> = vec![root.nodeid];
    index_of.insert(root.nodeid, 0);
    let mut queue = VecDeque::from([root.nodeid]);

    while let Some(id) = queue.pop_front() {
        let node = by_id[&id];
        if node.leaf.is_some() {
            continue;
        }

        let (yes, no) = match (node.yes, node.no) {
            (Some(yes), Some(no)) if yes != no => (yes, no),
            _ => {
                return Err(invalid(format!(
                    "split node {id} needs distinct yes/no children"
                )))
            }
        };
        let missing = node.missing.unwrap_or(yes);
        if missing != yes && missing != no {
            return Err(invalid(format!(
                "node {id} routes missing values to {missing}, which is not a child"
            )));
        }

        for child in [yes, no] {
            if !by_id.contains_key(&child) {
                return Err(invalid(format!("node {id} references unknown node {child}")));
            }
            if index_of.contains_key(&child) {
                return Err(invalid(format!("node {child} is reachable more than once")));
            }
            index_of.insert(child, order.len());
            order.push(child);
            queue.push_back(child);
        }
    }

    let mut nodes = Vec::with_capacity(order.len());
    for id in &order {
        let node = by_id[id];
        if let Some(value) = node.leaf {
            if !value.is_finite() {
                return Err(invalid(format!("leaf {id} has non-finite value")));
            }
            nodes.push(Node::Leaf(value));
            continue;
        }

        let split = node
            .split
            .as_deref()
            .ok_or_else(|| invalid(format!("node {id} has neither leaf nor split")))?;
        let feature = resolve_feature(split)
            .ok_or_else(|| invalid(format!("node {id} splits on unknown feature '{split}'")))?;
        let threshold = node
            .split_condition
            .filter(|t| t.is_finite())
            .ok_or_else(|| invalid(format!("node {id} has no usable split_condition")))?;

        // Children were validated in the walk above.
        let yes = node.yes.unwrap_or_default();
        let no = node.no.unwrap_or_default();
        let missing = node.missing.unwrap_or(yes);

        nodes.push(Node::Split {
            feature,
            threshold,
            yes: index_of[&yes],
            no: index_of[&no],
            missing: index_of[&missing],
        });
    }

    Ok(Tree { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLUCOSE_STUMP: &str = r#"{
        "base_score": 20.0,
        "trees": [
            {"nodeid": 0, "depth": 0, "split": "f3", "split_condition": 150.0,
             "yes": 1, "no": 2, "missing": 2,
             "children": [{"nodeid": 1, "leaf": -5.0}, {"nodeid": 2, "leaf": 10.0}]}
        ]
    }"#;

    fn vector_with(index: usize, value: f64) -> FeatureVector {
        let mut v = [0.0; FEATURE_COUNT];
        v[index] = value;
        FeatureVector(v)
    }

    #[test]
    fn test_yes_no_branches() {
        let model = TreeEnsemble::from_json(GLUCOSE_STUMP).unwrap();
        assert_eq!(model.predict(&vector_with(3, 100.0)), 15.0);
        assert_eq!(model.predict(&vector_with(3, 150.0)), 30.0);
        assert_eq!(model.predict(&vector_with(3, 200.0)), 30.0);
    }

    #[test]
    fn test_missing_branch() {
        let model = TreeEnsemble::from_json(GLUCOSE_STUMP).unwrap();
        assert_eq!(model.predict(&vector_with(3, f64::NAN)), 30.0);
    }

    #[test]
    fn test_named_split_and_sum_over_trees() {
        let json = r#"{
            "base_score": 1.0,
            "trees": [
                {"nodeid": 0, "split": "sleep_hours", "split_condition": 6.0, "yes": 1, "no": 2,
                 "children": [{"nodeid": 1, "leaf": 2.0}, {"nodeid": 2, "leaf": 0.5}]},
                {"nodeid": 0, "leaf": 0.25}
            ]
        }"#;
        let model = TreeEnsemble::from_json(json).unwrap();
        assert_eq!(model.tree_count(), 2);
        assert_eq!(model.predict(&vector_with(8, 5.0)), 3.25);
        assert_eq!(model.predict(&vector_with(8, 8.0)), 1.75);
    }

    #[test]
    fn test_dangling_child_rejected() {
        let json = r#"{
            "base_score": 0.0,
            "trees": [{"nodeid": 0, "split": "f0", "split_condition": 1.0, "yes": 1, "no": 7,
                       "children": [{"nodeid": 1, "leaf": 1.0}]}]
        }"#;
        assert!(matches!(
            TreeEnsemble::from_json(json),
            Err(ArtifactError::InvalidTree { tree: 0, .. })
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let json = r#"{
            "base_score": 0.0,
            "trees": [{"nodeid": 0, "split": "f0", "split_condition": 1.0, "yes": 1, "no": 0,
                       "children": [{"nodeid": 1, "leaf": 1.0}]}]
        }"#;
        assert!(TreeEnsemble::from_json(json).is_err());
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let json = r#"{
            "base_score": 0.0,
            "trees": [{"nodeid": 0, "split": "f12", "split_condition": 1.0, "yes": 1, "no": 2,
                       "children": [{"nodeid": 1, "leaf": 1.0}, {"nodeid": 2, "leaf": 2.0}]}]
        }"#;
        assert!(TreeEnsemble::from_json(json).is_err());
    }

    #[test]
    fn test_resolve_feature() {
        assert_eq!(resolve_feature("f0"), Some(0));
        assert_eq!(resolve_feature("blood_glucose"), Some(3));
        assert_eq!(resolve_feature("f10"), None);
        assert_eq!(resolve_feature("glucose"), None);
    }
}
