use crate::RelayPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayView {
    pub phase: RelayPhase,
    pub feature_active: bool,
    pub pending_translations: usize,
}
