// ABOUTME: Configuration constants shared across Innerspell packages
// ABOUTME: Re-exports environment variable names and their defaults

pub mod constants;

pub use constants::*;
