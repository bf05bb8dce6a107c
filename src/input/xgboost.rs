//! Reader for boosters saved with XGBoost's JSON model format.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use serde::Deserialize;

use crate::input::InputError;
use crate::model::ensemble::{Objective, TreeEnsemble, logit};
use crate::model::tree::{NO_CHILD, Node, Tree};

#[derive(Debug, Deserialize)]
struct ModelDoc {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveDoc,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct ObjectiveDoc {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<GbTreeModel>,
    /// Present for `dart`, wrapping the tree model.
    #[serde(default)]
    gbtree: Option<Box<GradientBooster>>,
    #[serde(default)]
    weight_drop: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct GbTreeModel {
    trees: Vec<TreeDoc>,
    #[serde(default)]
    tree_info: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct TreeDoc {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    default_left: Vec<FlagValue>,
    sum_hessian: Vec<f64>,
    /// 0 numerical, 1 categorical. Absent in models older than 1.6.
    #[serde(default)]
    split_type: Vec<u8>,
}

/// `default_left` is written as booleans by older releases and as 0/1 by newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Int(i64),
}

impl FlagValue {
    fn as_bool(&self) -> bool {
        match self {
            FlagValue::Bool(b) => *b,
            FlagValue::Int(i) => *i != 0,
        }
    }
}

pub fn load_xgboost_json(path: &Path) -> Result<TreeEnsemble, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(path.display().to_string()));
    }
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    parse_xgboost_json(&mmap[..])
}

pub fn parse_xgboost_json(bytes: &[u8]) -> Result<TreeEnsemble, InputError> {
    let doc: ModelDoc = serde_json::from_slice(bytes)?;
    let learner = doc.learner;

    let objective = match learner.objective.name.as_str() {
        "binary:logistic" | "reg:logistic" => Objective::Logistic,
        "binary:logitraw" => Objective::LogitRaw,
        other => {
            return Err(InputError::UnsupportedModel(format!(
                "objective {} is not a binary logistic objective",
                other
            )));
        }
    };

    let params = &learner.learner_model_param;
    if let Some(num_class) = &params.num_class {
        let n = parse_param_usize("num_class", num_class)?;
        if n > 1 {
            return Err(InputError::UnsupportedModel(format!(
                "multiclass booster with {} classes",
                n
            )));
        }
    }
    let n_features = parse_param_usize("num_feature", &params.num_feature)?;
    let base_score = parse_base_score(&params.base_score)?;
    let base_margin = match objective {
        Objective::Logistic => {
            if !(base_score > 0.0 && base_score < 1.0) {
                return Err(InputError::InvalidInput(format!(
                    "base_score {} is not a probability",
                    base_score
                )));
            }
            logit(base_score)
        }
        Objective::LogitRaw => base_score,
    };

    let (model, weight_drop) = match learner.gradient_booster.name.as_str() {
        "gbtree" => (learner.gradient_booster.model, Vec::new()),
        "dart" => {
            let weights = learner.gradient_booster.weight_drop;
            let inner = learner.gradient_booster.gbtree.ok_or_else(|| {
                InputError::InvalidInput("dart booster without gbtree section".to_string())
            })?;
            (inner.model, weights)
        }
        other => {
            return Err(InputError::UnsupportedModel(format!(
                "gradient booster {} has no trees",
                other
            )));
        }
    };
    let model = model
        .ok_or_else(|| InputError::InvalidInput("booster has no model section".to_string()))?;

    if model.tree_info.iter().any(|&g| g != 0) {
        return Err(InputError::UnsupportedModel(
            "booster has trees for more than one output group".to_string(),
        ));
    }
    if !weight_drop.is_empty() && weight_drop.len() != model.trees.len() {
        return Err(InputError::InvalidInput(format!(
            "dart weight_drop has {} entries for {} trees",
            weight_drop.len(),
            model.trees.len()
        )));
    }

    let mut trees = Vec::with_capacity(model.trees.len());
    for (idx, doc) in model.trees.into_iter().enumerate() {
        if let Some(node) = doc.split_type.iter().position(|&t| t != 0) {
            return Err(InputError::UnsupportedModel(format!(
                "tree {} node {} is a categorical split; only numeric splits are supported",
                idx, node
            )));
        }
        let scale = weight_drop.get(idx).copied().unwrap_or(1.0);
        let tree = convert_tree(doc, scale)
            .map_err(|msg| InputError::InvalidInput(format!("tree {}: {}", idx, msg)))?;
        tree.validate(n_features)
            .map_err(|msg| InputError::InvalidInput(format!("tree {}: {}", idx, msg)))?;
        trees.push(tree);
    }

    if !learner.feature_names.is_empty() && learner.feature_names.len() != n_features {
        return Err(InputError::InvalidInput(format!(
            "model lists {} feature names but num_feature is {}",
            learner.feature_names.len(),
            n_features
        )));
    }

    Ok(TreeEnsemble {
        trees,
        base_margin,
        objective,
        n_features,
        feature_names: learner.feature_names,
    })
}

fn convert_tree(doc: TreeDoc, scale: f64) -> Result<Tree, String> {
    let n = doc.left_children.len();
    if doc.right_children.len() != n
        || doc.split_indices.len() != n
        || doc.split_conditions.len() != n
        || doc.default_left.len() != n
        || doc.sum_hessian.len() != n
    {
        return Err("node arrays have mismatched lengths".to_string());
    }
    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let left = doc.left_children[i];
        let is_leaf = left == NO_CHILD;
        nodes.push(Node {
            left,
            right: doc.right_children[i],
            feature: doc.split_indices[i],
            threshold: doc.split_conditions[i],
            default_left: doc.default_left[i].as_bool(),
            value: if is_leaf {
                doc.split_conditions[i] as f64 * scale
            } else {
                0.0
            },
            cover: doc.sum_hessian[i],
        });
    }
    Ok(Tree { nodes })
}

fn parse_param_usize(name: &str, raw: &str) -> Result<usize, InputError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| InputError::Parse(format!("{} is not an integer: {:?}", name, raw)))
}

/// Accepts the scalar form (`"5E-1"`) and the vector form (`"[5E-1]"`).
fn parse_base_score(raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next().unwrap_or("").trim();
    first
        .parse::<f64>()
        .map_err(|_| InputError::Parse(format!("base_score is not a number: {:?}", raw)))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/xgboost.rs"]
mod tests;
