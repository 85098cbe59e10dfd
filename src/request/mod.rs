//! Physical request assembly
//!
//! The assembled request always fetches full source, never reports document
//! versions and always counts total hits exactly. These are fixed so every
//! response downstream has the same shape.

mod assembler;

pub use assembler::{PhysicalRequest, RequestAssembler};
