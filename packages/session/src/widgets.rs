//! Fold state of the widget panels.

use std::collections::BTreeMap;

use storm_impact_filter::WidgetId;

/// Which widget panels are folded. Every panel starts folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFolds {
    folded: BTreeMap<WidgetId, bool>,
}

impl Default for WidgetFolds {
    fn default() -> Self {
        Self {
            folded: WidgetId::all().iter().map(|id| (*id, true)).collect(),
        }
    }
}

impl WidgetFolds {
    /// Creates the fold state with every panel folded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a panel is folded.
    #[must_use]
    pub fn is_folded(&self, id: WidgetId) -> bool {
        self.folded.get(&id).copied().unwrap_or(true)
    }

    /// Folds or unfolds one panel.
    pub fn set_fold(&mut self, id: WidgetId, folded: bool) {
        self.folded.insert(id, folded);
    }

    /// Flips one panel (title click).
    pub fn toggle(&mut self, id: WidgetId) {
        let folded = self.is_folded(id);
        self.set_fold(id, !folded);
    }

    /// Folds or unfolds every panel.
    pub fn fold_all(&mut self, folded: bool) {
        for value in self.folded.values_mut() {
            *value = folded;
        }
    }

    /// Folds every panel except `id`, which is unfolded.
    pub fn show_exclusively(&mut self, id: WidgetId) {
        self.fold_all(true);
        self.set_fold(id, false);
    }

    /// Unfolded panels.
    #[must_use]
    pub fn unfolded(&self) -> Vec<WidgetId> {
        self.folded
            .iter()
            .filter(|(_, folded)| !**folded)
            .map(|(id, _)| *id)
            .collect()
    }
}
