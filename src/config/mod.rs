pub mod context;
pub mod schema;
