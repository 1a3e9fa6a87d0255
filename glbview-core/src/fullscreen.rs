/// Methods on the root element that enter fullscreen, probed in order because
/// browsers disagree on names. The browser host calls the first one that exists.
pub const REQUEST_ENTRY_POINTS: &[&str] = &[
    "requestFullscreen",
    "mozRequestFullScreen",
    "webkitRequestFullscreen",
    "msRequestFullscreen",
];

/// Methods on the document that leave fullscreen
pub const EXIT_ENTRY_POINTS: &[&str] = &[
    "exitFullscreen",
    "mozCancelFullScreen",
    "webkitExitFullscreen",
    "msExitFullscreen",
];

/// Document properties holding the current fullscreen element
pub const ELEMENT_PROPERTIES: &[&str] = &[
    "fullscreenElement",
    "mozFullScreenElement",
    "webkitFullscreenElement",
    "msFullscreenElement",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenAction {
    /// Call a request entry point on the root element
    Enter,
    /// Call an exit entry point on the document
    Exit,
}

impl FullscreenAction {
    pub fn entry_points(self) -> &'static [&'static str] {
        match self {
            FullscreenAction::Enter => REQUEST_ENTRY_POINTS,
            FullscreenAction::Exit => EXIT_ENTRY_POINTS,
        }
    }
}

/// Toggle: leave when something is fullscreen, enter otherwise
pub fn plan(is_fullscreen: bool) -> FullscreenAction {
    if is_fullscreen {
        FullscreenAction::Exit
    } else {
        FullscreenAction::Enter
    }
}

/// First name in `table` that `is_present` accepts
pub fn resolve(table: &'static [&'static str], is_present: impl Fn(&str) -> bool) -> Option<&'static str> {
    table.iter().copied().find(|name| is_present(name))
}
