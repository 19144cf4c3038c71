//! Parsers for the CAD formats rendered in-process.

pub mod dxf;
pub mod step;
pub mod stl;
