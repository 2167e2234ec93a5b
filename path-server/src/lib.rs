//! Path server.
//!
//! Accepts a list of coordinates, answers with a token at once, and works out
//! in the background the shortest driving order that starts at the first
//! point and visits all the others. Clients poll with the token.

pub mod cache;
pub mod config;
pub mod directions;
pub mod domain;
pub mod service;
pub mod solver;
pub mod store;
pub mod web;
