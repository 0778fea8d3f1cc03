//! Gradient-boosted regression trees
//!
//! Reads trees in the XGBoost JSON dump shape:
//!
//! ```text
//! {"nodeid": 0, "split": "MedInc", "split_condition": 5.0, "yes": 1, "no": 2,
//!  "children": [{"nodeid": 1, "leaf": 0.4}, {"nodeid": 2, "leaf": 1.9}]}
//! ```
//!
//! `x < split_condition` goes to `yes`. Split names are schema keys or the
//! positional `f<index>` form. Trees are flattened once at load time.

use std::collections::HashMap;

use serde::Deserialize;

use super::inference::{check_width, InferenceError, ModelMetadata, RegressionModel};
use crate::logic::features::{FeatureSchema, FeatureVector};

// ============================================================================
// DUMP FORMAT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        nodeid: u32,
        split: String,
        split_condition: f64,
        yes: u32,
        no: u32,
        children: Vec<TreeNode>,
    },
    Leaf {
        nodeid: u32,
        leaf: f64,
    },
}

impl TreeNode {
    fn nodeid(&self) -> u32 {
        match self {
            TreeNode::Split { nodeid, .. } | TreeNode::Leaf { nodeid, .. } => *nodeid,
        }
    }
}

// ============================================================================
// COMPILED TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone)]
pub struct CompiledTree {
    nodes: Vec<Node>,
}

impl CompiledTree {
    /// Flatten a dumped tree, resolving split names against the schema
    pub fn compile(root: &TreeNode, schema: &FeatureSchema) -> Result<Self, String> {
        let mut dumped = Vec::new();
        collect(root, &mut dumped);

        let mut slots = HashMap::with_capacity(dumped.len());
        for (slot, node) in dumped.iter().enumerate() {
            if slots.insert(node.nodeid(), slot).is_some() {
                return Err(format!("duplicate nodeid {}", node.nodeid()));
            }
        }

        let slot_of = |id: u32| {
            slots
                .get(&id)
                .copied()
                .ok_or_else(|| format!("reference to unknown nodeid {}", id))
        };

        let mut nodes = Vec::with_capacity(dumped.len());
        for node in &dumped {
            nodes.push(match node {
                TreeNode::Leaf { leaf, .. } => Node::Leaf(*leaf),
                TreeNode::Split {
                    split,
                    split_condition,
                    yes,
                    no,
                    ..
                } => Node::Split {
                    feature: resolve_feature(split, schema)?,
                    threshold: *split_condition,
                    yes: slot_of(*yes)?,
                    no: slot_of(*no)?,
                },
            });
        }

        Ok(Self { nodes })
    }

    pub fn evaluate(&self, values: &[f64]) -> Result<f64, InferenceError> {
        let mut slot = 0;

        // A well-formed tree never visits more nodes than it has
        for _ in 0..self.nodes.len() {
            match self.nodes.get(slot) {
                Some(Node::Leaf(value)) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                }) => {
                    let x = values.get(*feature).copied().ok_or_else(|| {
                        InferenceError(format!("split on missing feature index {}", feature))
                    })?;
                    slot = if x < *threshold { *yes } else { *no };
                }
                None => break,
            }
        }

        Err(InferenceError("tree walk did not reach a leaf".to_string()))
    }
}

fn collect<'a>(node: &'a TreeNode, out: &mut Vec<&'a TreeNode>) {
    out.push(node);
    if let TreeNode::Split { children, .. } = node {
        for child in children {
            collect(child, out);
        }
    }
}

fn resolve_feature(split: &str, schema: &FeatureSchema) -> Result<usize, String> {
    if let Some(index) = schema.index_of(split) {
        return Ok(index);
    }

    split
        .strip_prefix('f')
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|&i| i < schema.len())
        .ok_or_else(|| format!("split on unknown feature '{}'", split))
}

// ============================================================================
// ENSEMBLE
// ============================================================================

#[derive(Debug, Clone)]
pub struct TreeEnsembleRegressor {
    base_score: f64,
    trees: Vec<CompiledTree>,
    features: usize,
    metadata: ModelMetadata,
}

impl TreeEnsembleRegressor {
    pub fn new(
        base_score: f64,
        trees: Vec<CompiledTree>,
        features: usize,
        metadata: ModelMetadata,
    ) -> Self {
        Self {
            base_score,
            trees,
            features,
            metadata,
        }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl RegressionModel for TreeEnsembleRegressor {
    fn predict(&self, input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        check_width(input, self.features)?;

        let mut sum = self.base_score;
        for tree in &self.trees {
            sum += tree.evaluate(input.as_slice())?;
        }

        Ok(vec![sum])
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> TreeNode {
        serde_json::from_value(value).unwrap()
    }

    fn stump() -> TreeNode {
        tree(json!({
            "nodeid": 0, "depth": 0, "split": "MedInc", "split_condition": 5.0,
            "yes": 1, "no": 2, "missing": 1,
            "children": [
                {"nodeid": 1, "leaf": -0.5},
                {"nodeid": 2, "leaf": 1.25}
            ]
        }))
    }

    fn values_with(first: f64) -> Vec<f64> {
        let mut values = vec![1.0; 8];
        values[0] = first;
        values
    }

    #[test]
    fn test_stump_branches() {
        let schema = FeatureSchema::default();
        let compiled = CompiledTree::compile(&stump(), &schema).unwrap();

        assert_eq!(compiled.evaluate(&values_with(3.0)), Ok(-0.5));
        // Equal to the threshold goes right
        assert_eq!(compiled.evaluate(&values_with(5.0)), Ok(1.25));
    }

    #[test]
    fn test_positional_split_names() {
        let schema = FeatureSchema::default();
        let root = tree(json!({
            "nodeid": 0, "split": "f4", "split_condition": 1000.0, "yes": 2, "no": 1,
            "children": [
                {"nodeid": 2, "leaf": 10.0},
                {"nodeid": 1, "leaf": 20.0}
            ]
        }));

        let compiled = CompiledTree::compile(&root, &schema).unwrap();
        let mut values = vec![0.0; 8];
        values[4] = 322.0;
        assert_eq!(compiled.evaluate(&values), Ok(10.0));
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let schema = FeatureSchema::default();
        let root = tree(json!({
            "nodeid": 0, "split": "ocean_proximity", "split_condition": 1.0, "yes": 1, "no": 2,
            "children": [{"nodeid": 1, "leaf": 0.0}, {"nodeid": 2, "leaf": 0.0}]
        }));

        let err = CompiledTree::compile(&root, &schema).unwrap_err();
        assert!(err.contains("ocean_proximity"));

        let out_of_range = tree(json!({
            "nodeid": 0, "split": "f8", "split_condition": 1.0, "yes": 1, "no": 2,
            "children": [{"nodeid": 1, "leaf": 0.0}, {"nodeid": 2, "leaf": 0.0}]
        }));
        assert!(CompiledTree::compile(&out_of_range, &schema).is_err());
    }

    #[test]
    fn test_dangling_child_rejected() {
        let schema = FeatureSchema::default();
        let root = tree(json!({
            "nodeid": 0, "split": "MedInc", "split_condition": 1.0, "yes": 1, "no": 7,
            "children": [{"nodeid": 1, "leaf": 0.0}]
        }));

        let err = CompiledTree::compile(&root, &schema).unwrap_err();
        assert!(err.contains("unknown nodeid 7"));
    }

    #[test]
    fn test_cycle_does_not_hang() {
        let schema = FeatureSchema::default();
        let root = tree(json!({
            "nodeid": 0, "split": "MedInc", "split_condition": 1.0, "yes": 0, "no": 0,
            "children": []
        }));

        let compiled = CompiledTree::compile(&root, &schema).unwrap();
        assert!(compiled.evaluate(&values_with(3.0)).is_err());
    }
}
