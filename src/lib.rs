//! Labcache
//!
//! Learned biomarker pattern cache that routes lab-report chunks around LLM
//! extraction. Everything lives in [`labcache_core`]; this crate re-exports it.

pub use labcache_core::*;
