//! Business rules that decide whether an operation is allowed
//!
//! Rules are pure functions of the entity and the current time; refusals are
//! reported as `false`, not as errors.

pub mod work_queue;
