//! Concrete implementations of the traits defined in [core][crate::core].

pub mod media;
pub mod repo;
pub mod state;
pub mod storage;
