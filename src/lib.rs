//! Homestead - A lightweight real-estate listing platform
//!
//! This library provides the core functionality for the Homestead API:
//! accounts and authentication, property listings with search, and
//! self-hosted image uploads.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
