pub mod bin;
pub mod file;
pub mod folder;
pub mod quota;
