// src/lib.rs

pub mod common;
pub mod data;
pub mod readers;
pub mod store;
#[cfg(test)]
pub mod tests;
