//! `facelock register`, `clear` and `status`: thin D-Bus client for facelockd.

use anyhow::{Context, Result};

#[zbus::proxy(
    interface = "org.facelock.FaceLock1",
    default_service = "org.facelock.FaceLock1",
    default_path = "/org/facelock/FaceLock1",
    gen_blocking = false
)]
trait FaceLock {
    fn register(&self) -> zbus::Result<String>;
    fn clear_profile(&self) -> zbus::Result<()>;
    fn status(&self) -> zbus::Result<String>;
}

async fn connect(session: bool) -> Result<FaceLockProxy<'static>> {
    let conn = if session {
        zbus::Connection::session().await
    } else {
        zbus::Connection::system().await
    }
    .context("failed to connect to D-Bus")?;

    FaceLockProxy::new(&conn)
        .await
        .context("failed to create facelockd proxy")
}

pub async fn register(session: bool) -> Result<()> {
    let proxy = connect(session).await?;
    let profile_id = proxy
        .register()
        .await
        .context("registration failed; center your face in frame and retry")?;
    println!("Registered profile {profile_id}");
    Ok(())
}

pub async fn clear(session: bool) -> Result<()> {
    let proxy = connect(session).await?;
    proxy.clear_profile().await.context("clear failed")?;
    println!("Profile cleared");
    Ok(())
}

pub async fn status(session: bool) -> Result<()> {
    let proxy = connect(session).await?;
    let raw = proxy.status().await.context("status request failed")?;
    tracing::debug!(raw = %raw, "status reply");
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("daemon returned malformed status")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
