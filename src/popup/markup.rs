use crate::grouping::group::LayerGroup;

pub const POPUP_ROOT_CLASS: &str = "pick-popup";
pub const TAB_BUTTON_CLASS: &str = "pick-popup-tab";
pub const TAB_PANEL_CLASS: &str = "pick-popup-panel";
pub const ACTIVE_CLASS: &str = "active";
/// Attribute carrying the group key on tab buttons and panels; the delegated
/// popup-root click handler reads it back to know which tab was clicked.
pub const TAB_KEY_ATTRIBUTE: &str = "data-tab-key";
/// Visible divider between concatenated entries within one panel.
pub const ENTRY_SEPARATOR: &str = "<hr class=\"pick-popup-separator\">";

/// Button label: the group title, with a count suffix only when the group
/// holds more than one match.
pub fn tab_button_label(group: &LayerGroup) -> String {
    if group.matches.len() > 1 {
        format!("{} ({})", group.title, group.matches.len())
    } else {
        group.title.clone()
    }
}

/// Compose the tab strip and content panels for a disambiguation popup.
///
/// The panel for `active_key` is shown and its button marked active; every
/// other panel is hidden. Panel bodies concatenate their group's cached
/// content blobs verbatim, separated by [`ENTRY_SEPARATOR`].
pub fn tabbed_popup_markup(groups: &[LayerGroup], active_key: &str) -> String {
    let mut buttons = String::new();
    let mut panels = String::new();
    for group in groups {
        let is_active = group.key == active_key;
        let button_class = if is_active {
            format!("{} {}", TAB_BUTTON_CLASS, ACTIVE_CLASS)
        } else {
            TAB_BUTTON_CLASS.to_string()
        };
        buttons.push_str(&format!(
            "<button class=\"{}\" {}=\"{}\">{}</button>",
            button_class,
            TAB_KEY_ATTRIBUTE,
            escape_html(&group.key),
            escape_html(&tab_button_label(group))
        ));

        let entries: Vec<&str> = group
            .matches
            .iter()
            .map(|feature_match| feature_match.content.as_str())
            .collect();
        panels.push_str(&format!(
            "<div class=\"{}\" {}=\"{}\" style=\"display:{}\">{}</div>",
            TAB_PANEL_CLASS,
            TAB_KEY_ATTRIBUTE,
            escape_html(&group.key),
            if is_active { "block" } else { "none" },
            entries.join(ENTRY_SEPARATOR)
        ));
    }
    format!(
        "<div class=\"{root}\"><div class=\"{root}-tabs\">{}</div><div class=\"{root}-panels\">{}</div></div>",
        buttons,
        panels,
        root = POPUP_ROOT_CLASS
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::{tab_button_label, tabbed_popup_markup, ENTRY_SEPARATOR};
    use crate::grouping::group::{FeatureMatch, LayerGroup};

    fn group(key: &str, title: &str, contents: &[&str]) -> LayerGroup {
        LayerGroup {
            key: key.to_string(),
            title: title.to_string(),
            matches: contents
                .iter()
                .enumerate()
                .map(|(idx, content)| FeatureMatch {
                    feature_idx: idx,
                    group_key: key.to_string(),
                    group_title: title.to_string(),
                    content: content.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_count_suffix_only_for_multiple_matches() {
        let single = group("b", "Markers", &["<p>m1</p>"]);
        let double = group("a", "Zones", &["<p>z1</p>", "<p>z2</p>"]);
        assert_eq!(tab_button_label(&single), "Markers");
        assert_eq!(tab_button_label(&double), "Zones (2)");
    }

    #[test]
    fn test_first_tab_active_and_others_hidden() {
        let groups = vec![
            group("a", "Zones", &["<p>z1</p>", "<p>z2</p>"]),
            group("b", "Markers", &["<p>m1</p>"]),
        ];
        let markup = tabbed_popup_markup(&groups, "a");

        assert_eq!(markup.matches("<button").count(), 2);
        assert!(markup.contains("pick-popup-tab active\" data-tab-key=\"a\""));
        assert!(!markup.contains("active\" data-tab-key=\"b\""));
        assert!(markup.contains("data-tab-key=\"a\" style=\"display:block\""));
        assert!(markup.contains("data-tab-key=\"b\" style=\"display:none\""));
    }

    #[test]
    fn test_entries_joined_with_separator() {
        let groups = vec![group("a", "Zones", &["<p>z1</p>", "<p>z2</p>"])];
        let markup = tabbed_popup_markup(&groups, "a");
        assert!(markup.contains(&format!("<p>z1</p>{}<p>z2</p>", ENTRY_SEPARATOR)));
        // A single-entry panel gets no separator.
        let markup = tabbed_popup_markup(&[group("b", "Markers", &["<p>m1</p>"])], "b");
        assert!(!markup.contains(ENTRY_SEPARATOR));
    }

    #[test]
    fn test_labels_are_escaped() {
        let groups = vec![group("a", "Cafes & Bars <central>", &["<p>c</p>"])];
        let markup = tabbed_popup_markup(&groups, "a");
        assert!(markup.contains("Cafes &amp; Bars &lt;central&gt;"));
    }
}
