//! Translation of DID Documents into registry delegate/attribute changes.

pub mod planner;
pub mod sink;

pub use planner::{
    AttributeUpdate, Base64Source, DelegateUpdate, DocumentUpdate, MalformedInputPolicy,
    PlannerConfig, UpdateList, UpdatePlanner,
};
pub use sink::UpdateSink;
