pub mod meta;
pub mod resource;
pub mod kinds;

pub use meta::{Condition, ConditionStatus, Conditions, ObjectMeta, ObjectRef, OwnerReference};
pub use resource::{HasConditions, Kind, Resource};
