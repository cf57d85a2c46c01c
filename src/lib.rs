pub mod cli;
pub mod colors;
pub mod config;
pub mod emit;
pub mod error;
pub mod fsutil;
pub mod linker;
pub mod manifest;
pub mod pnp;
pub mod resolver;
#[cfg(test)]
pub mod tests;
