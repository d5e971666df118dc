pub mod aggregate;
pub mod flags;
pub mod ledger;
pub mod module_config;
pub mod primitive;
pub mod threshold;
