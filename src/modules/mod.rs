//! Self-contained building blocks with no database or HTTP dependencies

pub mod pdf;
