use async_trait::async_trait;
use netctl::{NetworkManager, ShellExecutor, SystemShell};
use wire::LinkParameters;

use super::Role;
use crate::error::Result;

/// What `engage` captured and `restore` needs to put the host back.
/// Owned values, no global state.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkRestore {
    /// Nothing was touched.
    Untouched,
    /// The ad-hoc profile to tear down and the connection that was active
    /// before it.
    Connection { ssid: String, previous: String },
}

/// How a peer gets onto the direct link's network. One session runtime,
/// parameterized by this, covers the ad-hoc, local-wifi and localhost
/// deployments.
#[async_trait]
pub trait NetworkStrategy: Send + Sync {
    /// Reconfigure the host for the link. Failures here are fatal to
    /// session startup.
    async fn engage(&self, role: Role, params: &LinkParameters) -> Result<NetworkRestore>;

    /// Undo `engage`. Failures are logged and swallowed so the cleanup
    /// contract holds on every exit path.
    async fn restore(&self, restore: NetworkRestore);
}

/// The peers already share a network (localhost or an existing LAN);
/// nothing to do.
pub struct ExistingNetwork;

#[async_trait]
impl NetworkStrategy for ExistingNetwork {
    async fn engage(&self, _role: Role, _params: &LinkParameters) -> Result<NetworkRestore> {
        Ok(NetworkRestore::Untouched)
    }

    async fn restore(&self, _restore: NetworkRestore) {}
}

/// Stand up the ad-hoc WiFi link described by the parameters, remembering
/// the previously active connection for teardown.
pub struct AdHocNetwork<E: ShellExecutor + Send + Sync> {
    manager: NetworkManager<E>,
}

impl AdHocNetwork<SystemShell> {
    /// Backed by the real nmcli.
    pub fn system() -> Self {
        AdHocNetwork {
            manager: NetworkManager::new(SystemShell),
        }
    }
}

impl<E: ShellExecutor + Send + Sync> AdHocNetwork<E> {
    pub fn new(manager: NetworkManager<E>) -> Self {
        AdHocNetwork { manager }
    }
}

impl<E: ShellExecutor + Send + Sync> AdHocNetwork<E> {
    async fn bring_up(&self, role: Role, params: &LinkParameters, device: &str) -> Result<()> {
        let stale = match role {
            Role::Robot => self.manager.profile_exists(&params.ssid).await?,
            Role::Operator => self.manager.profile_listed(&params.ssid).await?,
        };
        let own_ip = match role {
            Role::Robot => &params.server_ip,
            Role::Operator => &params.client_ip,
        };

        self.manager
            .replace_adhoc_profile(&params.ssid, device, own_ip, stale)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<E: ShellExecutor + Send + Sync> NetworkStrategy for AdHocNetwork<E> {
    async fn engage(&self, role: Role, params: &LinkParameters) -> Result<NetworkRestore> {
        let devices = self.manager.wifi_devices().await?;
        let device = devices.first().ok_or(netctl::Error::ErrNoWifiDevice)?;
        let previous = self.manager.active_connection(device).await?;

        let restore = NetworkRestore::Connection {
            ssid: params.ssid.clone(),
            previous,
        };

        // A half-configured profile still gets torn down; the old
        // connection comes back before the error surfaces.
        if let Err(e) = self.bring_up(role, params, device).await {
            self.restore(restore).await;
            return Err(e);
        }

        Ok(restore)
    }

    async fn restore(&self, restore: NetworkRestore) {
        let NetworkRestore::Connection { ssid, previous } = restore else {
            return;
        };

        if let Err(e) = self.manager.deactivate(&ssid).await {
            log::warn!("could not deactivate {ssid}: {e}");
        }
        if let Err(e) = self.manager.activate(&previous).await {
            log::warn!("could not reactivate {previous}: {e}");
        }
    }
}
