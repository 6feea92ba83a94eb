mod accounts;
#[cfg(test)]
mod memory;

pub use accounts::{AccountRepo, DynAccountRepo};
#[cfg(test)]
pub use memory::MemoryRepo;
