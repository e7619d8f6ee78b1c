pub mod assignment;
pub mod collection;
pub mod config;
pub mod dates;
pub mod db;
pub mod environment;
pub mod errors;
pub mod ids;
pub mod label;
pub mod movie;
pub mod normalization;
pub mod routes;
pub mod session;
pub mod urls;
pub mod user;
