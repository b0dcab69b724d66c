//! Plans, steps and the step state machine.

pub mod entities;
pub mod plan_parser;
pub mod value_objects;
