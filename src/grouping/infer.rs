use crate::feature::rendered::{FeatureIdx, RenderedFeature};

/// Structural markers recognized in popup markup, mapped to the layer-type
/// key they identify.
///
/// Content sniffing is a compatibility shim for features rendered without an
/// explicit layer tag; producers should always set `layer_type` on the
/// feature and never rely on this table.
const CONTENT_MARKERS: [(&str, &str); 4] = [
    ("class=\"station-popup\"", "stations"),
    ("class=\"segment-popup\"", "segments"),
    ("class=\"zone-popup\"", "zones"),
    ("class=\"incident-popup\"", "incidents"),
];

const LAYER_TYPE_ATTRIBUTE: &str = "data-layer-type=\"";

/// Resolved grouping identity of one matched feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIdentity {
    pub key: String,
    pub title: String,
}

/// Resolve the grouping key and display title for a matched feature.
///
/// Key priority: the explicit layer-type tag, then a `data-layer-type`
/// attribute or known structural marker in the popup markup, then a slug of
/// the popup heading text, and finally a synthetic per-feature key. The
/// synthetic key guarantees a feature with no identifiable type still gets
/// its own distinct group instead of silently merging into an unrelated one.
pub fn resolve_group_identity(
    feature: &RenderedFeature,
    content: &str,
    idx: FeatureIdx,
) -> GroupIdentity {
    let heading = heading_text(content);

    let key = feature
        .layer_type
        .clone()
        .or_else(|| sniff_content_key(content))
        .or_else(|| {
            heading
                .as_deref()
                .map(slugify)
                .filter(|slug| !slug.is_empty())
        })
        .unwrap_or_else(|| format!("feature-{}", idx));

    let title = feature
        .layer_title
        .clone()
        .or(heading)
        .unwrap_or_else(|| format!("Feature {}", idx + 1));

    GroupIdentity { key, title }
}

/// Scan popup markup for a `data-layer-type` attribute, then for the known
/// marker classes.
fn sniff_content_key(content: &str) -> Option<String> {
    if let Some(attr_at) = content.find(LAYER_TYPE_ATTRIBUTE) {
        let value_at = attr_at + LAYER_TYPE_ATTRIBUTE.len();
        if let Some(end) = content[value_at..].find('"') {
            let value = &content[value_at..value_at + end];
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    CONTENT_MARKERS
        .iter()
        .find(|(marker, _)| content.contains(marker))
        .map(|(_, key)| (*key).to_string())
}

/// Text of the first h1-h4 element in the markup, if any.
fn heading_text(content: &str) -> Option<String> {
    for level in 1..=4 {
        let open_tag = format!("<h{}", level);
        let close_tag = format!("</h{}>", level);
        let Some(open_at) = content.find(&open_tag) else {
            continue;
        };
        let Some(text_at) = content[open_at..].find('>').map(|off| open_at + off + 1) else {
            continue;
        };
        let Some(close_at) = content[text_at..].find(&close_tag).map(|off| text_at + off)
        else {
            continue;
        };
        let text = content[text_at..close_at].trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }
    None
}

fn slugify(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    slug.trim_matches('-').to_string()
}
