//! Serve command.

use crate::config::Settings;

#[cfg(feature = "http-server")]
pub async fn run(settings: Settings, bind: Option<String>) -> anyhow::Result<()> {
    crate::server::serve(settings, bind).await
}

#[cfg(not(feature = "http-server"))]
pub async fn run(_settings: Settings, _bind: Option<String>) -> anyhow::Result<()> {
    anyhow::bail!("HTTP server support requires the 'http-server' feature")
}
