//! # Sprintbase API Server Library
//!
//! This library provides the core functionality for the Sprintbase API
//! server: projects, sprints, backlog stories, and tasks behind a
//! JWT-authenticated, membership-gated REST surface.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
