use std::collections::BTreeMap;

///
/// IdRanges
///
/// Set of ids kept as disjoint inclusive runs. Postings of one lexeme come
/// out of the index in ascending order, so a scan over them costs one run
/// per gap rather than one entry per id.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IdRanges {
    // start -> inclusive end
    runs: BTreeMap<u64, u64>,
}

impl IdRanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.runs
            .range(..=id)
            .next_back()
            .is_some_and(|(_, end)| *end >= id)
    }

    /// Add `id`, joining neighbouring runs. False when already present.
    pub fn insert(&mut self, id: u64) -> bool {
        let below = self.runs.range(..=id).next_back().map(|(s, e)| (*s, *e));
        if let Some((_, end)) = below
            && end >= id
        {
            return false;
        }

        let above_end = id.checked_add(1).and_then(|next| self.runs.remove(&next));
        let end = above_end.unwrap_or(id);
        match below {
            Some((start, below_end)) if below_end.checked_add(1) == Some(id) => {
                self.runs.insert(start, end);
            }
            _ => {
                self.runs.insert(id, end);
            }
        }

        true
    }

    /// Number of disjoint runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }
}
