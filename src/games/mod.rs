//! Game implementations.

pub mod kittens;
