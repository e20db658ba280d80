// Infrastructure layer module
// Contains the PostgreSQL adapters behind the domain repository traits

pub mod repositories;
