// src/renderer/pipelines/mod.rs
pub mod terrain;
