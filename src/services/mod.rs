//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! The store clients (`assets`, `screens`) talk to the backend; `fonts`
//! fetches and registers font faces; `preview` is pure composition. The
//! `editor` shell ties them into one editing session so route handlers stay
//! focused on protocol translation.

pub mod assets;
pub mod editor;
pub mod fonts;
pub mod preview;
pub mod screens;
