// API layer module (adapters for controllers)
// Routes each entity's CRUD and relation operations to the repositories

pub mod errors;
pub mod handlers;
pub mod router;
