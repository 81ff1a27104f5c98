//! Wizard facade: what presentation layers use to drive a session.

pub mod accessor;
pub mod steps;

pub use accessor::{Advanced, SessionAccessor, partner_name};
pub use steps::{StepSubmission, start, submit};
