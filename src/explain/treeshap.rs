//! Exact path-dependent TreeSHAP for additive tree ensembles.
//!
//! Each tree is walked once per row while tracking, for every feature seen on
//! the current root-to-node path, the fraction of training cover that flows
//! down the path when the feature is unknown (`zero_fraction`) and whether the
//! row itself follows the path (`one_fraction`). Leaves distribute their value
//! over those features with Shapley weights, so per row
//! `sum(phi) + expected_value == margin`.

use crate::model::ensemble::TreeEnsemble;
use crate::model::tree::Tree;

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// Model feature index, `None` for the root element.
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    pweight: f64,
}

/// Attributions for one row in model feature order.
pub fn explain_row(model: &TreeEnsemble, row: &[f64], phi: &mut [f64]) {
    debug_assert_eq!(phi.len(), model.n_features);
    for v in phi.iter_mut() {
        *v = 0.0;
    }
    for tree in &model.trees {
        tree_shap(tree, row, phi);
    }
}

pub fn tree_shap(tree: &Tree, row: &[f64], phi: &mut [f64]) {
    recurse(tree, row, phi, 0, &[], 0, 1.0, 1.0, None);
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    row: &[f64],
    phi: &mut [f64],
    node_idx: usize,
    parent_path: &[PathElement],
    unique_depth: usize,
    parent_zero_fraction: f64,
    parent_one_fraction: f64,
    parent_feature: Option<usize>,
) {
    let mut path: Vec<PathElement> = Vec::with_capacity(unique_depth + 2);
    path.extend_from_slice(&parent_path[..unique_depth]);
    extend_path(
        &mut path,
        unique_depth,
        parent_zero_fraction,
        parent_one_fraction,
        parent_feature,
    );
    let mut unique_depth = unique_depth;

    let node = &tree.nodes[node_idx];
    if node.is_leaf() {
        for i in 1..=unique_depth {
            let w = unwound_path_sum(&path, unique_depth, i);
            let el = path[i];
            if let Some(feature) = el.feature {
                phi[feature] += w * (el.one_fraction - el.zero_fraction) * node.value;
            }
        }
        return;
    }

    let hot = tree.next_node(node_idx, row);
    let cold = if hot == node.left as usize {
        node.right as usize
    } else {
        node.left as usize
    };
    let hot_zero_fraction = tree.nodes[hot].cover / node.cover;
    let cold_zero_fraction = tree.nodes[cold].cover / node.cover;
    let mut incoming_zero_fraction = 1.0;
    let mut incoming_one_fraction = 1.0;

    let split_feature = node.feature as usize;
    if let Some(k) = (1..=unique_depth).find(|&k| path[k].feature == Some(split_feature)) {
        incoming_zero_fraction = path[k].zero_fraction;
        incoming_one_fraction = path[k].one_fraction;
        unwind_path(&mut path, unique_depth, k);
        unique_depth -= 1;
    }

    recurse(
        tree,
        row,
        phi,
        hot,
        &path,
        unique_depth + 1,
        hot_zero_fraction * incoming_zero_fraction,
        incoming_one_fraction,
        Some(split_feature),
    );
    recurse(
        tree,
        row,
        phi,
        cold,
        &path,
        unique_depth + 1,
        cold_zero_fraction * incoming_zero_fraction,
        0.0,
        Some(split_feature),
    );
}

fn extend_path(
    path: &mut Vec<PathElement>,
    unique_depth: usize,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    path.truncate(unique_depth);
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if unique_depth == 0 { 1.0 } else { 0.0 },
    });
    let d = unique_depth as f64;
    for i in (0..unique_depth).rev() {
        let fi = i as f64;
        path[i + 1].pweight += one_fraction * path[i].pweight * (fi + 1.0) / (d + 1.0);
        path[i].pweight = zero_fraction * path[i].pweight * (d - fi) / (d + 1.0);
    }
}

fn unwind_path(path: &mut Vec<PathElement>, unique_depth: usize, path_index: usize) {
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let d = unique_depth as f64;
    let mut next_one_portion = path[unique_depth].pweight;

    for i in (0..unique_depth).rev() {
        let fi = i as f64;
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (d + 1.0) / ((fi + 1.0) * one_fraction);
            next_one_portion = tmp - path[i].pweight * zero_fraction * (d - fi) / (d + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (d + 1.0) / (zero_fraction * (d - fi));
        }
    }

    for i in path_index..unique_depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.truncate(unique_depth);
}

/// Total permutation weight of the path with element `path_index` removed.
fn unwound_path_sum(path: &[PathElement], unique_depth: usize, path_index: usize) -> f64 {
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let d = unique_depth as f64;
    let mut next_one_portion = path[unique_depth].pweight;
    let mut total = 0.0;

    for i in (0..unique_depth).rev() {
        let fi = i as f64;
        if one_fraction != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((fi + 1.0) * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * ((d - fi) / (d + 1.0));
        } else if zero_fraction != 0.0 {
            total += (path[i].pweight / zero_fraction) / ((d - fi) / (d + 1.0));
        }
    }
    total
}

#[cfg(test)]
#[path = "../../tests/src_inline/explain/treeshap.rs"]
mod tests;
