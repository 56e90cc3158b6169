// src/lib.rs

//! OpenSSF Scorecard Monitor Library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
