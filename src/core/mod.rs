pub mod analysis;
pub mod crypto;
pub mod export;
pub mod identity;
pub mod services;
