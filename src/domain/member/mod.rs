// Member domain module
// Contains the member aggregate and its write payloads

#![allow(clippy::module_inception)]

pub mod member;

pub use member::{Member, MemberData, MemberPatch};
