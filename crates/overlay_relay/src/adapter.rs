use overlay_core::SiteProfile;
use overlay_dom::{Document, NodeId};

/// Site-specific DOM query primitives. This is the only surface through
/// which the relay touches any site's selectors; the per-site CSS adapters
/// of the extension implement it.
pub trait SiteChatAdapter {
    /// The chat container, or `None` when the site has not rendered its
    /// chat widget yet. A `None` here is tolerated, not fatal.
    fn chat_root(&self, doc: &Document) -> Option<NodeId>;

    /// All elements whose class attribute contains `marker`.
    fn elements_by_marker(&self, doc: &Document, marker: &str) -> Vec<NodeId>;

    /// True for error banners; those are never relayed for translation.
    fn is_error_node(&self, doc: &Document, node: NodeId) -> bool;
}

/// Adapter that resolves everything through marker-class queries. Covers
/// the supported sites' structure well enough for hosts and tests; a site
/// needing real selector logic brings its own implementation.
pub struct MarkerSiteAdapter {
    root_marker: String,
    error_marker: String,
}

impl MarkerSiteAdapter {
    pub fn new(root_marker: impl Into<String>, error_marker: impl Into<String>) -> Self {
        Self {
            root_marker: root_marker.into(),
            error_marker: error_marker.into(),
        }
    }

    pub fn for_profile(profile: &SiteProfile) -> Self {
        Self::new(profile.list_marker, "chat-error")
    }
}

impl SiteChatAdapter for MarkerSiteAdapter {
    fn chat_root(&self, doc: &Document) -> Option<NodeId> {
        doc.find_by_marker(&self.root_marker).into_iter().next()
    }

    fn elements_by_marker(&self, doc: &Document, marker: &str) -> Vec<NodeId> {
        doc.find_by_marker(marker)
    }

    fn is_error_node(&self, doc: &Document, node: NodeId) -> bool {
        doc.element(node)
            .map(|e| e.classes().contains(&self.error_marker))
            .unwrap_or(false)
    }
}
