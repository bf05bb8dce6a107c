pub const NO_CHILD: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub left: i32,
    pub right: i32,
    /// Model feature index; unused for leaves.
    pub feature: u32,
    pub threshold: f32,
    pub default_left: bool,
    /// Leaf value; unused for internal nodes.
    pub value: f64,
    pub cover: f64,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.left == NO_CHILD
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Child taken by `row` at internal node `idx`. Values are compared in
    /// single precision, NaN follows the default branch.
    pub fn next_node(&self, idx: usize, row: &[f64]) -> usize {
        let node = &self.nodes[idx];
        let x = row[node.feature as usize];
        let go_left = if x.is_nan() {
            node.default_left
        } else {
            (x as f32) < node.threshold
        };
        if go_left {
            node.left as usize
        } else {
            node.right as usize
        }
    }

    pub fn leaf_value(&self, row: &[f64]) -> f64 {
        let mut idx = 0usize;
        while !self.nodes[idx].is_leaf() {
            idx = self.next_node(idx, row);
        }
        self.nodes[idx].value
    }

    /// Cover-weighted mean of the leaf values.
    pub fn mean_value(&self) -> f64 {
        self.node_mean(0)
    }

    fn node_mean(&self, idx: usize) -> f64 {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            return node.value;
        }
        let left = &self.nodes[node.left as usize];
        let right = &self.nodes[node.right as usize];
        (left.cover * self.node_mean(node.left as usize)
            + right.cover * self.node_mean(node.right as usize))
            / node.cover
    }

    pub fn max_depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            return 0;
        }
        1 + self
            .depth_from(node.left as usize)
            .max(self.depth_from(node.right as usize))
    }

    /// Every node reachable from the root must have in-range children, a
    /// known split feature, and be visited once.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n = self.nodes.len();
        let mut seen = vec![false; n];
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            if seen[idx] {
                return Err(format!("node {} is reachable twice", idx));
            }
            seen[idx] = true;
            let node = &self.nodes[idx];
            if node.is_leaf() {
                continue;
            }
            for child in [node.left, node.right] {
                if child < 0 || child as usize >= n {
                    return Err(format!("node {} has invalid child {}", idx, child));
                }
                stack.push(child as usize);
            }
            if node.cover.is_nan() || node.cover <= 0.0 {
                return Err(format!("node {} has non-positive cover", idx));
            }
            if node.feature as usize >= n_features {
                return Err(format!(
                    "node {} splits on feature {} but the model has {} features",
                    idx, node.feature, n_features
                ));
            }
        }
        Ok(())
    }
}
