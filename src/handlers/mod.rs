// src/handlers/mod.rs

pub mod admin;
pub mod attempts;
pub mod auth;
pub mod catalog;
pub mod enrollment;
pub mod profile;
