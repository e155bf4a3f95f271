pub mod catalog;
pub mod config;
pub mod dates;
pub mod environment;
pub mod errors;
pub mod geo;
pub mod ids;
pub mod local;
pub mod nearby;
pub mod normalization;
pub mod path;
pub mod place;
pub mod records;
pub mod routes;
pub mod search;
pub mod statistics;
pub mod status;
pub mod visit;
