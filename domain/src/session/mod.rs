//! Sessions

pub mod entities;
