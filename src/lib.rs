//! Deterministic ISAAC keystream generator for the game protocol.
//!
//! Both endpoints of a connection construct a generator from the seed agreed
//! during the handshake and draw one 32-bit value per obfuscated field. The
//! streams stay bit-identical as long as the peers draw in lockstep. This is
//! obfuscation, not cryptography - no authentication, no strength claims.

mod isaac;

pub use isaac::{Isaac, SeedError};
