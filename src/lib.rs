#![doc = include_str!("../README.md")]

pub mod cycles;
pub mod depth;
pub mod perf;
