//! Parameter grids
//!
//! A full grid is the Cartesian product over its keys in sorted order, with
//! the last key varying fastest. Points are addressed by index, so a grid is
//! never materialized.

use std::collections::BTreeMap;

use serde_json::Value;

use super::Params;

#[derive(Debug, Clone, PartialEq)]
enum GridKind {
    Full(Vec<(String, Vec<Value>)>),
    Points(Vec<Params>),
}

/// Ordered sequence of hyper-parameter mappings to evaluate an algorithm with.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    kind: GridKind,
}

impl ParameterGrid {
    /// Cartesian product over the candidate values of each parameter.
    ///
    /// An empty mapping yields a single empty point; a parameter with no
    /// candidate values yields an empty grid.
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use serde_json::json;
    /// use tsad_bench::params::ParameterGrid;
    ///
    /// let mut values = BTreeMap::new();
    /// values.insert("a".to_string(), vec![json!(1), json!(2)]);
    /// values.insert("b".to_string(), vec![json!(true), json!(false)]);
    /// let grid = ParameterGrid::full(values);
    ///
    /// assert_eq!(grid.len(), 4);
    /// assert_eq!(grid.get(1).unwrap()["b"], json!(false));
    /// ```
    #[must_use]
    pub fn full(values: BTreeMap<String, Vec<Value>>) -> Self {
        Self {
            kind: GridKind::Full(values.into_iter().collect()),
        }
    }

    /// Explicit list of points, evaluated in the given order.
    #[must_use]
    pub fn from_points(points: Vec<Params>) -> Self {
        Self {
            kind: GridKind::Points(points),
        }
    }

    /// Grid with exactly one point.
    #[must_use]
    pub fn fixed(params: Params) -> Self {
        Self::from_points(vec![params])
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.kind {
            GridKind::Full(axes) => axes.iter().map(|(_, values)| values.len()).product(),
            GridKind::Points(points) => points.len(),
        }
    }

    /// Whether the grid has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point at `index`, or `None` if out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Params> {
        if index >= self.len() {
            return None;
        }
        match &self.kind {
            GridKind::Points(points) => points.get(index).cloned(),
            GridKind::Full(axes) => {
                let mut remainder = index;
                let mut point = Params::new();
                for (key, values) in axes.iter().rev() {
                    let offset = remainder % values.len();
                    remainder /= values.len();
                    point.insert(key.clone(), values[offset].clone());
                }
                Some(point)
            }
        }
    }

    /// Iterate over all points in order.
    #[must_use]
    pub const fn iter(&self) -> ParameterGridIter<'_> {
        ParameterGridIter {
            grid: self,
            index: 0,
        }
    }
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self::fixed(Params::new())
    }
}

/// Iterator over the points of a `ParameterGrid`.
#[derive(Debug, Clone)]
pub struct ParameterGridIter<'a> {
    grid: &'a ParameterGrid,
    index: usize,
}

impl Iterator for ParameterGridIter<'_> {
    type Item = Params;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.grid.get(self.index)?;
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a> IntoIterator for &'a ParameterGrid {
    type Item = Params;
    type IntoIter = ParameterGridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid() -> ParameterGrid {
        let mut values = BTreeMap::new();
        values.insert("window".to_string(), vec![json!(10), json!(20), json!(30)]);
        values.insert("alpha".to_string(), vec![json!(0.1), json!(0.2)]);
        ParameterGrid::full(values)
    }

    #[test]
    fn test_full_grid_order_last_key_fastest() {
        let points: Vec<Params> = grid().iter().collect();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0]["alpha"], json!(0.1));
        assert_eq!(points[0]["window"], json!(10));
        assert_eq!(points[1]["window"], json!(20));
        assert_eq!(points[3]["alpha"], json!(0.2));
        assert_eq!(points[3]["window"], json!(10));
    }

    #[test]
    fn test_empty_mapping_has_one_point() {
        let grid = ParameterGrid::full(BTreeMap::new());
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(0), Some(Params::new()));
        assert_eq!(grid.get(1), None);
    }

    #[test]
    fn test_empty_axis_yields_empty_grid() {
        let mut values = BTreeMap::new();
        values.insert("a".to_string(), vec![json!(1)]);
        values.insert("b".to_string(), vec![]);
        let grid = ParameterGrid::full(values);
        assert!(grid.is_empty());
        assert_eq!(grid.iter().count(), 0);
    }

    #[test]
    fn test_explicit_points_keep_order() {
        let first: Params = serde_json::from_value(json!({"z": 1})).unwrap();
        let second: Params = serde_json::from_value(json!({"a": 2})).unwrap();
        let grid = ParameterGrid::from_points(vec![first.clone(), second.clone()]);
        assert_eq!(grid.iter().collect::<Vec<_>>(), vec![first, second]);
    }
}
