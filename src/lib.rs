//! Team Directory API Library
//!
//! REST API over Team and Member records backed by PostgreSQL, with
//! LoopBack-style CRUD endpoints, relation traversal, and an
//! application-level referential-integrity gate on the member -> team
//! foreign key.

pub mod api;
pub mod domain;
pub mod infrastructure;
