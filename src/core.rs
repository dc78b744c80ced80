//! The core module defines the business logic of cumulus.
//! It provides the traits and models upstream adapters need to implement.

pub mod media;
pub mod model;
pub mod path;
pub mod provider;
pub mod repo;
pub mod service;
pub mod storage;
