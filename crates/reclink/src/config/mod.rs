#[allow(clippy::module_inception)]
mod config;

pub(crate) use config::Config;

pub(crate) const CONFIG_FILE_NAME: &str = "config.toml";
pub(crate) const CONFIG_FLAG: &str = "--config";
