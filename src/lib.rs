pub mod certs;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod encoding;
pub mod login;
pub mod proxy;
pub mod redfish;
pub mod session;
pub mod target;
