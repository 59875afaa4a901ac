/// Instructions for moving the active tab of a mounted popup: show the
/// activated panel, hide the rest, and move the active-state styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSwitch {
    pub activate_key: String,
    pub deactivate_keys: Vec<String>,
}

/// Seam to the rendering library that owns the actual popup DOM.
///
/// Opening a popup replaces whatever popup is already on screen. Mounting of
/// the popup subtree is asynchronous on the library side; the host reports
/// completion through `MapSession::on_popup_mounted`, and must treat
/// `apply_tab_switch` as a no-op if the subtree is not mounted.
pub trait PopupHost {
    fn open(&mut self, anchor: geo::Coord, markup: &str);
    fn close(&mut self);
    fn apply_tab_switch(&mut self, switch: &TabSwitch);
}
