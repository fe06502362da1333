use crate::view_model::RelayView;
use crate::{RequestId, SiteProfile};

/// Mount lifecycle of one relay instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayPhase {
    /// Mounted, but the chat root has not been resolved yet.
    #[default]
    Idle,
    /// Watcher attached; mutation batches are processed.
    Watching,
    /// Torn down; late replies are dropped.
    Unmounted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayState<A> {
    profile: SiteProfile,
    phase: RelayPhase,
    feature_active: bool,
    next_request: RequestId,
    pending: Vec<PendingTranslation<A>>,
}

/// An in-flight request and the message node its reply must annotate.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingTranslation<A> {
    request_id: RequestId,
    anchor: A,
}

impl<A: Copy + PartialEq> RelayState<A> {
    /// `feature_active` is the flag value read once at mount time; later
    /// changes arrive as `Msg::FeatureChanged`.
    pub fn new(profile: SiteProfile, feature_active: bool) -> Self {
        Self {
            profile,
            phase: RelayPhase::default(),
            feature_active,
            next_request: 1,
            pending: Vec::new(),
        }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    pub fn feature_active(&self) -> bool {
        self.feature_active
    }

    pub fn view(&self) -> RelayView {
        RelayView {
            phase: self.phase,
            feature_active: self.feature_active,
            pending_translations: self.pending.len(),
        }
    }

    pub(crate) fn set_phase(&mut self, phase: RelayPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_feature_active(&mut self, active: bool) {
        self.feature_active = active;
    }

    pub(crate) fn alloc_request(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request += 1;
        id
    }

    pub(crate) fn remember_anchor(&mut self, request_id: RequestId, anchor: A) {
        self.pending.push(PendingTranslation { request_id, anchor });
    }

    /// Removes and returns the anchor for a reply. `None` for unknown or
    /// already-consumed request ids (e.g. replies arriving after unmount).
    pub(crate) fn take_anchor(&mut self, request_id: RequestId) -> Option<A> {
        let idx = self
            .pending
            .iter()
            .position(|p| p.request_id == request_id)?;
        Some(self.pending.swap_remove(idx).anchor)
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
    }
}
