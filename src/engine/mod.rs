//! Planning engine: the two editable documents (timeline and party), their
//! undo histories, and the derived lane, interference and mitigation views.

mod error;
pub mod history;
pub mod interference;
pub mod lanes;
pub mod mitigation;
pub mod party;
pub mod timeline;
pub mod views;

pub use error::EngineError;
pub use history::{DocumentKind, History};
pub use interference::{detect_interference, SkillInterference};
pub use lanes::{find_available_lane, is_lane_available};
pub use mitigation::{aggregate_mitigation, MitigationCurve, MitigationSample, MITIGATION_CAP};
pub use party::{
    create_party, MemberPatch, NewPlacement, PartyEditor, PartyPatch, PlacementPatch, DEFAULT_MEMBER,
    DEFAULT_ROSTER,
};
pub use timeline::{BurstPatch, ContentPatch, GimmickPatch, NewGimmick, PhasePatch, TimelineEditor};
pub use views::{PlanViews, ViewStats};
