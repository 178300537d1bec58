use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// In-memory contents of an ascii input file: a rectangular numeric matrix
/// plus an optional single-line comment (without its `#`/`!` prefix).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsciiData {
    pub values: Vec<Vec<f64>>,
    pub comment: String,
}

impl AsciiData {
    pub fn new(values: Vec<Vec<f64>>, comment: impl Into<String>) -> Self {
        Self {
            values,
            comment: comment.into(),
        }
    }

    /// `(rows, cols)`; `(0, 0)` for empty data.
    pub fn shape(&self) -> (usize, usize) {
        let rows = self.values.len();
        let cols = self.values.first().map(Vec::len).unwrap_or(0);
        (rows, cols)
    }

    /// True iff every row has the same length.
    pub fn is_rectangular(&self) -> bool {
        let (_, cols) = self.shape();
        self.values.iter().all(|row| row.len() == cols)
    }

    /// Element-wise comparison within an absolute tolerance. Comments must
    /// match exactly.
    pub fn approx_eq(&self, other: &Self, atol: f64) -> bool {
        self.comment == other.comment
            && self.shape() == other.shape()
            && self
                .values
                .iter()
                .flatten()
                .zip(other.values.iter().flatten())
                .all(|(a, b)| (a - b).abs() <= atol)
    }
}

/// One variable of a [`Dataset`]: named dimensions, row-major values, and
/// string attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub dims: Vec<String>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub attrs: IndexMap<String, String>,
}

impl Variable {
    pub fn new(dims: impl IntoIterator<Item = impl Into<String>>, values: Vec<f64>) -> Self {
        Self {
            dims: dims.into_iter().map(Into::into).collect(),
            values,
            attrs: IndexMap::new(),
        }
    }
}

/// A self-describing gridded dataset: named dimension extents, variables
/// declared over those dimensions, and global attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dims: IndexMap<String, usize>,
    pub variables: IndexMap<String, Variable>,
    #[serde(default)]
    pub attrs: IndexMap<String, String>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dim(mut self, name: impl Into<String>, extent: usize) -> Self {
        self.dims.insert(name.into(), extent);
        self
    }

    pub fn variable(mut self, name: impl Into<String>, var: Variable) -> Self {
        self.variables.insert(name.into(), var);
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// True iff every variable's dimensions are declared and its value count
    /// equals the product of their extents.
    pub fn is_consistent(&self) -> bool {
        self.variables.values().all(|var| {
            let extent: Option<usize> = var
                .dims
                .iter()
                .map(|d| self.dims.get(d).copied())
                .try_fold(1usize, |acc, e| e.map(|e| acc * e));
            extent == Some(var.values.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_shape_and_rectangularity() {
        let data = AsciiData::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], "frac");
        assert_eq!(data.shape(), (2, 2));
        assert!(data.is_rectangular());

        let ragged = AsciiData::new(vec![vec![1.0], vec![2.0, 3.0]], "");
        assert!(!ragged.is_rectangular());
    }

    #[test]
    fn ascii_approx_eq_respects_tolerance_and_comment() {
        let a = AsciiData::new(vec![vec![1.0, 2.0]], "c");
        let b = AsciiData::new(vec![vec![1.00001, 2.0]], "c");
        assert!(a.approx_eq(&b, 1e-4));
        assert!(!a.approx_eq(&b, 1e-7));
        let c = AsciiData::new(vec![vec![1.0, 2.0]], "other");
        assert!(!a.approx_eq(&c, 1e-4));
    }

    #[test]
    fn dataset_consistency_checks_dim_products() {
        let ok = Dataset::new()
            .dim("x", 2)
            .dim("y", 3)
            .variable("t", Variable::new(["x", "y"], vec![0.0; 6]));
        assert!(ok.is_consistent());

        let short = Dataset::new()
            .dim("x", 2)
            .variable("t", Variable::new(["x"], vec![0.0; 3]));
        assert!(!short.is_consistent());

        let undeclared = Dataset::new().variable("t", Variable::new(["z"], vec![0.0]));
        assert!(!undeclared.is_consistent());
    }
}
