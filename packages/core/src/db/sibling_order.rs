/// Computes integer `sort_order` values for sibling lists.
///
/// Orders are kept contiguous (`0..n`) within a destination list whenever
/// it is rewritten; untouched parents may keep gaps.
pub struct SiblingOrderCalculator;

impl SiblingOrderCalculator {
    /// Order value for appending after `existing` siblings
    ///
    /// # Examples
    /// ```
    /// # use navtree_core::db::SiblingOrderCalculator;
    /// assert_eq!(SiblingOrderCalculator::append_order(&[]), 0);
    /// assert_eq!(SiblingOrderCalculator::append_order(&[0, 4, 2]), 5);
    /// ```
    pub fn append_order(existing: &[i64]) -> i64 {
        existing.iter().max().map_or(0, |max| max + 1)
    }

    /// Sequential orders for `ids` in the given sequence
    pub fn renumber<S: AsRef<str>>(ids: &[S]) -> Vec<(String, i64)> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| (id.as_ref().to_string(), i as i64))
            .collect()
    }

    /// Insert `moved` into `siblings` at `index` (clamped) and renumber
    ///
    /// `siblings` must already exclude `moved`.
    pub fn place(siblings: &[String], moved: &str, index: usize) -> Vec<(String, i64)> {
        let index = index.min(siblings.len());
        let mut ordered: Vec<&str> = siblings.iter().map(String::as_str).collect();
        ordered.insert(index, moved);
        Self::renumber(&ordered)
    }
}
