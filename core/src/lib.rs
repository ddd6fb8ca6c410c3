pub mod aggregate;
pub mod catalog;
pub mod cycle;
pub mod db;
pub mod energy;
pub mod error;
pub mod models;
pub mod plan;
pub mod service;
