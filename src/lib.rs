// src/lib.rs

//! yad2-watch library: polls Yad2 result pages and reports new listings.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
