pub mod error;
pub mod photos;
pub mod ports;
pub mod repo;
pub mod roles;
pub mod service;
