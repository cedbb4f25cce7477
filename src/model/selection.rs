use indexmap::IndexSet;

/// Derived selection mode, a function of selection size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Empty,
    Single,
    Multi,
}

/// Client-local selection state: which task ids are selected, in what
/// order they were selected, and the anchor for range selection.
///
/// The backing `IndexSet` keeps membership and order in one structure, so
/// the "set and sequence always agree, no duplicates" invariant holds by
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: IndexSet<String>,
    last_selected: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        SelectionState::default()
    }

    /// Replace the selection with exactly `id`.
    pub fn select_task(&mut self, id: &str) {
        self.selected.clear();
        self.selected.insert(id.to_string());
        self.last_selected = Some(id.to_string());
    }

    /// Add `id` if absent (appended to the order), remove it if present.
    pub fn toggle_task(&mut self, id: &str) {
        if !self.selected.shift_remove(id) {
            self.selected.insert(id.to_string());
        }
        self.last_selected = Some(id.to_string());
    }

    /// Select the contiguous slice of `visual_order` between the last
    /// selected id and `id`, inclusive. The resulting order is visual
    /// order, not click order. Without a usable anchor this behaves as
    /// `select_task`.
    pub fn range_select(&mut self, id: &str, visual_order: &[String]) {
        let anchor_idx = self
            .last_selected
            .as_deref()
            .and_then(|anchor| visual_order.iter().position(|v| v == anchor));
        let target_idx = visual_order.iter().position(|v| v == id);

        let (Some(a), Some(b)) = (anchor_idx, target_idx) else {
            self.select_task(id);
            return;
        };

        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        self.selected.clear();
        for v in &visual_order[start..=end] {
            self.selected.insert(v.clone());
        }
        // Anchor moves to the triggering id, not a range endpoint.
        self.last_selected = Some(id.to_string());
    }

    /// Select every id, ordered by `visual_order`.
    pub fn select_all(&mut self, visual_order: &[String]) {
        self.selected.clear();
        for v in visual_order {
            self.selected.insert(v.clone());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.last_selected = None;
    }

    pub fn mode(&self) -> SelectionMode {
        match self.selected.len() {
            0 => SelectionMode::Empty,
            1 => SelectionMode::Single,
            _ => SelectionMode::Multi,
        }
    }

    pub fn is_multi_select(&self) -> bool {
        self.mode() == SelectionMode::Multi
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids in selection order.
    pub fn order(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn last_selected(&self) -> Option<&str> {
        self.last_selected.as_deref()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
