//! Session system — the record two partners fill in and the state machine
//! that walks them through it.
//!
//! Partner A shares across six steps, a single transition screen hands the
//! device over, then partner B responds (two steps) and shares (two steps).

pub mod migration;
pub mod model;
pub mod state;

pub use migration::{LegacySession, StoredSession};
pub use model::{
    AcknowledgmentType, IStatement, PartnerAData, PartnerADataPatch, PartnerBData,
    PartnerBDataPatch, PartnerBResponses, PartnerBResponsesPatch, Session, SessionPatch,
    SessionStatus,
};
pub use state::{
    Activity, Location, PartnerRole, Phase, Position, StepInfo, Turn, advance, advance_patch,
    current_turn, route_for, route_for_session, step_info, try_route_for,
};
