//! Status effects and field conditions

pub mod condition;
pub mod conditions;
pub mod events;
pub mod status;
pub mod statuses;

pub use condition::{ConditionCx, ConditionDef, ConditionHooks, ConditionRegistry, ConditionState};
pub use status::{StatusCx, StatusDef, StatusHooks, StatusRegistry, StatusState};
