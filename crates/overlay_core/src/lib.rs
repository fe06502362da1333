//! Overlay core: pure relay state machine and site chat profiles.
mod effect;
mod msg;
mod site;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Envelope, EnvelopeKind};
pub use msg::{Msg, RequestId};
pub use site::{
    is_annotation, profile_by_name, ExtractionStep, SiteProfile, ANNOTATION_MARKER, SITE_PROFILES,
};
pub use snapshot::{MutationKind, MutationSnapshot, NodeSnapshot};
pub use state::{RelayPhase, RelayState};
pub use update::update;
pub use view_model::RelayView;
