//! Configuration, presets, lexicon, and the session driver for the
//! Glyphloop simulation.
//!
//! This crate closes the loop: a [`Session`] owns the world, advances it
//! frame by frame, turns its observables into glyphs on each macro tick,
//! records them in the [`Lexicon`], and injects spoken glyphs back into the
//! world as acts.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `glyphloop-config.yaml` into
//!   strongly-typed structs.
//! - [`presets`] -- Named parameter sets such as "first-contact".
//! - [`lexicon`] -- In-memory glyph lexicon keyed by signature hash.
//! - [`session`] -- The driver: frames, macro ticks, speaking, annotation
//!   requests.
//!
//! [`Session`]: session::Session
//! [`Lexicon`]: lexicon::Lexicon

pub mod config;
pub mod lexicon;
pub mod presets;
pub mod session;
