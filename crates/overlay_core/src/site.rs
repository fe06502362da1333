/// Class token written on every annotation node the relay injects.
///
/// The batch filter checks for this token before extracting, so the relay's
/// own DOM writes never feed back into new relay calls.
pub const ANNOTATION_MARKER: &str = "overlay-translated-msg";

/// Returns true if a class attribute carries the annotation marker token.
///
/// Shared by all site variants; exact token match, not a substring check,
/// so site marker classes can never collide with it by accident.
pub fn is_annotation(classes: &str) -> bool {
    classes.split_whitespace().any(|c| c == ANNOTATION_MARKER)
}

/// One step of a site's fixed message-extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStep {
    FirstChild,
    LastChild,
}

/// Static description of one supported site's chat markup convention.
///
/// The relay itself is site-agnostic; everything that varies between the
/// supported sites lives here as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteProfile {
    pub name: &'static str,
    /// Substring matched against the mutation target's class attribute to
    /// recognize the message-list container.
    pub list_marker: &'static str,
    /// Substring identifying system/room notices, which are never relayed.
    pub notice_marker: &'static str,
    /// Background tint applied to injected annotations on this site.
    pub tint: &'static str,
    /// Nesting steps from a message container down to its text node.
    pub extraction_path: &'static [ExtractionStep],
}

/// The three supported sites. Marker classes and nesting depths follow each
/// site's markup as observed; see the extraction note in DESIGN.md.
pub const SITE_PROFILES: [SiteProfile; 3] = [
    SiteProfile {
        name: "fvm",
        list_marker: "msg-list-fvm",
        notice_marker: "room-notice-fvm",
        tint: "#fff3c4",
        extraction_path: &[ExtractionStep::FirstChild, ExtractionStep::LastChild],
    },
    SiteProfile {
        name: "cmx",
        list_marker: "msg-list-cmx",
        notice_marker: "sys-notice-cmx",
        tint: "#d9f2e6",
        extraction_path: &[ExtractionStep::FirstChild],
    },
    SiteProfile {
        name: "strm",
        list_marker: "msg-feed-strm",
        notice_marker: "room-notice-strm",
        tint: "#e3ecfa",
        extraction_path: &[ExtractionStep::LastChild, ExtractionStep::FirstChild],
    },
];

/// Looks up a built-in site profile by name.
pub fn profile_by_name(name: &str) -> Option<SiteProfile> {
    SITE_PROFILES.iter().find(|p| p.name == name).copied()
}
