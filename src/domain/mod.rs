// Domain layer module exports
// Entities, repository traits, the query model, and the write gate
// Domain is independent of infrastructure concerns

pub mod errors;
pub mod gate;
pub mod member;
pub mod query;
pub mod repositories;
pub mod team;
