use crate::grouping::group::{FeatureMatch, GroupedResult, LayerGroup};
use crate::popup::host::TabSwitch;
use crate::popup::markup::tabbed_popup_markup;

/// What to present for one aggregated click.
#[derive(Debug)]
pub enum PopupDecision {
    /// Nothing under the click; no popup opens and no UI changes.
    NoMatch,
    /// Exactly one feature matched overall: open its own content directly,
    /// with no tab UI.
    Single(FeatureMatch),
    /// More than one match: open a tabbed disambiguation popup.
    Tabbed(TabbedPopup),
}

/// Decide the presentation for a grouped match set.
pub fn decide(grouped: GroupedResult) -> PopupDecision {
    match grouped.total_matches() {
        0 => PopupDecision::NoMatch,
        1 => {
            let mut matches = grouped.into_matches();
            PopupDecision::Single(matches.remove(0))
        }
        _ => match TabbedPopup::new(grouped.into_tab_groups()) {
            Some(popup) => PopupDecision::Tabbed(popup),
            // Unreachable with a non-empty match set; treated as no match.
            None => PopupDecision::NoMatch,
        },
    }
}

/// An open tabbed popup and its transient tab state. Lives only while the
/// popup is open; a new click builds a fresh one.
#[derive(Debug)]
pub struct TabbedPopup {
    groups: Vec<LayerGroup>,
    active_key: String,
    mounted: bool,
}

impl TabbedPopup {
    /// `None` when no groups were supplied. The first group's tab starts
    /// active.
    pub fn new(groups: Vec<LayerGroup>) -> Option<Self> {
        let active_key = groups.first()?.key.clone();
        Some(Self {
            groups,
            active_key,
            mounted: false,
        })
    }

    /// Markup for the popup as currently composed, active tab included.
    pub fn markup(&self) -> String {
        tabbed_popup_markup(&self.groups, &self.active_key)
    }

    pub fn groups(&self) -> &[LayerGroup] {
        &self.groups
    }

    pub fn active_key(&self) -> &str {
        &self.active_key
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// The host signals that the popup subtree finished mounting. Tab
    /// interaction stays disarmed until then.
    pub fn mark_mounted(&mut self) {
        self.mounted = true;
    }

    /// Delegated click on a tab button, identified by its key attribute.
    ///
    /// Returns the switch the host should apply, or `None` when the popup is
    /// not mounted yet or the key is unknown. In the unmounted case the
    /// already-rendered first-tab content stays visible, so degradation is
    /// silent.
    pub fn handle_tab_click(&mut self, key: &str) -> Option<TabSwitch> {
        if !self.mounted {
            return None;
        }
        if !self.groups.iter().any(|group| group.key == key) {
            return None;
        }
        self.active_key = key.to_string();
        Some(TabSwitch {
            activate_key: self.active_key.clone(),
            deactivate_keys: self
                .groups
                .iter()
                .filter(|group| group.key != key)
                .map(|group| group.key.clone())
                .collect(),
        })
    }
}
