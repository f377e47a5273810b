//! IO modules - side effects (network, archive files)

pub mod archive;
pub mod pushlog;
