//! Glyph encoding, decoding, and operator resolution for the Glyphloop
//! simulation.
//!
//! Everything here is stateless and synchronous: functions read
//! observables or glyph specs and return new values. Nothing touches
//! world state; the driver pushes the resulting [`GlyphAct`] back into the
//! simulator itself.
//!
//! # Modules
//!
//! - [`mixhash`] -- Stateless integer mixers and the signature hash.
//! - [`encoder`] -- Quantization and procedural shape generation ([`generate`]).
//! - [`decoder`] -- Categorical bins, tokens, embeddings ([`parse`]) and the
//!   operator rule table ([`tokens_to_operator`]).
//! - [`operator`] -- Turning a glyph into an injectable act ([`create_glyph_act`]).
//!
//! [`GlyphAct`]: glyphloop_types::GlyphAct

pub mod decoder;
pub mod encoder;
pub mod mixhash;
pub mod operator;

pub use decoder::{cosine_similarity, parse, tokens_to_operator};
pub use encoder::{Quantized, generate, quantize};
pub use operator::{create_glyph_act, resolve_operator};
