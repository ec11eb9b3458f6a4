//! Various utilities

pub mod pnext;
