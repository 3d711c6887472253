//! Shared primitives for `esp-memmap`.
//!
//! This crate holds the pieces every other crate in the workspace needs but
//! that belong to none of them specifically: an owned/mmap'd byte buffer
//! ([`ByteView`]), the C-style integer literal parser linker map files use
//! for addresses and lengths, and the [`Diagnostics`] sink that carries
//! recoverable ("logical warning") anomalies out of the parser and builder.

#![warn(missing_docs)]
#![allow(clippy::module_inception)]

mod byteview;
mod diagnostics;
mod numeric;

pub use byteview::ByteView;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use numeric::parse_c_uint;
