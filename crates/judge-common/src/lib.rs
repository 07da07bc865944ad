pub mod error;
pub mod solvedac;
pub mod tier;
