//! IO modules - side effects (network, filesystem, disk images)

pub mod dmg;
pub mod download;
pub mod extract;
pub mod hash;
