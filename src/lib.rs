pub mod acl;
pub mod config;
pub mod dao;
pub mod error;
pub mod metadata;
pub mod model;
pub mod provider;
