use crate::feature::rendered::FeatureIdx;

/// Maximum number of distinct groups rendered as tabs. Groups encountered
/// beyond the cap keep their matches in the underlying set but get no tab.
pub const MAX_TAB_GROUPS: usize = 10;

/// One feature that passed the hit test, with its resolved identity and
/// popup content.
#[derive(Debug, Clone)]
pub struct FeatureMatch {
    pub feature_idx: FeatureIdx,
    pub group_key: String,
    pub group_title: String,
    pub content: String,
}

/// Matches sharing one layer-type key, in discovery order.
#[derive(Debug, Clone)]
pub struct LayerGroup {
    pub key: String,
    pub title: String,
    pub matches: Vec<FeatureMatch>,
}

/// Hit-test matches bucketed by layer-type key.
///
/// Groups appear in the order their key was first encountered and members
/// keep their draw order; no further ranking is applied.
#[derive(Debug, Clone)]
pub struct GroupedResult {
    groups: Vec<LayerGroup>,
    total_matches: usize,
}

/// Bucket matches by their resolved group key.
pub fn group_matches(matches: Vec<FeatureMatch>) -> GroupedResult {
    let total_matches = matches.len();
    let mut groups: Vec<LayerGroup> = Vec::new();
    for feature_match in matches {
        if let Some(group) = groups
            .iter_mut()
            .find(|group| group.key == feature_match.group_key)
        {
            group.matches.push(feature_match);
        } else {
            groups.push(LayerGroup {
                key: feature_match.group_key.clone(),
                title: feature_match.group_title.clone(),
                matches: vec![feature_match],
            });
        }
    }
    GroupedResult {
        groups,
        total_matches,
    }
}

impl GroupedResult {
    /// All groups, uncapped.
    pub fn groups(&self) -> &[LayerGroup] {
        &self.groups
    }

    /// Groups eligible for tab generation, capped at [`MAX_TAB_GROUPS`].
    pub fn tab_groups(&self) -> &[LayerGroup] {
        &self.groups[..self.groups.len().min(MAX_TAB_GROUPS)]
    }

    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    /// All matches in their original discovery order, uncapped.
    pub fn into_matches(self) -> Vec<FeatureMatch> {
        let mut matches = Vec::with_capacity(self.total_matches);
        for group in self.groups {
            matches.extend(group.matches);
        }
        matches
    }

    /// Groups for tab generation, consuming the result and applying the cap.
    pub fn into_tab_groups(mut self) -> Vec<LayerGroup> {
        self.groups.truncate(MAX_TAB_GROUPS);
        self.groups
    }
}
