pub mod cli;
pub mod controller;
pub mod error;
pub mod render;
pub mod source;
