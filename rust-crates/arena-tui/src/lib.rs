pub mod config;
pub mod http;
pub mod session;
pub mod sui_client;
pub mod walrus_client;
pub mod wallets;

#[cfg(test)]
pub(crate) mod test_helpers;
