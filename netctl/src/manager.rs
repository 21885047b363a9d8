
use crate::command;
use crate::error::{Error, Result};
use crate::shell::{ShellExecutor, ShellOutput};

/// nmcli exits with 10 when `con show <name>` finds no such connection;
/// for a probe that is an answer, not a failure.
const MISSING_CONNECTION_STATUS: i32 = 10;

/// Drives NetworkManager through its CLI. Pure side effects; all state
/// worth restoring is returned to the caller as owned values.
pub struct NetworkManager<E: ShellExecutor> {
    shell: E,
}

impl<E: ShellExecutor> NetworkManager<E> {
    pub fn new(shell: E) -> Self {
        NetworkManager { shell }
    }

    /// Names of the wireless devices on this host.
    pub async fn wifi_devices(&self) -> Result<Vec<String>> {
        let output = self.checked(command::list_wifi_devices()).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect())
    }

    /// The connection currently active on `device`, recorded before the
    /// ad-hoc switch so it can be restored afterwards.
    pub async fn active_connection(&self, device: &str) -> Result<String> {
        let output = self.checked(command::active_connection(device)).await?;
        let name = output.stdout.trim();
        if name.is_empty() {
            return Err(Error::ErrNoActiveConnection(device.to_owned()));
        }
        Ok(name.to_owned())
    }

    /// Probe by profile name; exit code 10 means "not present", which is
    /// success with answer `false`.
    pub async fn profile_exists(&self, ssid: &str) -> Result<bool> {
        let command = command::show_connection(ssid);
        let output = self.shell.run(&command).await?;

        if output.status == MISSING_CONNECTION_STATUS {
            return Ok(false);
        }
        if !output.success() {
            return Err(Error::ErrCommandFailed {
                command,
                stderr: output.stderr,
            });
        }
        Ok(!output.stdout.trim().is_empty())
    }

    /// Probe via the connection list; an empty grep exits non-zero, which
    /// here just means "not listed".
    pub async fn profile_listed(&self, ssid: &str) -> Result<bool> {
        let output = self.shell.run(&command::grep_connection(ssid)).await?;
        Ok(output.success() && !output.stdout.trim().is_empty())
    }

    /// Create and activate an ad-hoc profile carrying `ip` on `device`,
    /// deleting a stale profile of the same name first when asked to.
    pub async fn replace_adhoc_profile(
        &self,
        ssid: &str,
        device: &str,
        ip: &str,
        delete_stale: bool,
    ) -> Result<()> {
        if delete_stale {
            self.checked(command::delete_connection(ssid)).await?;
        }
        self.checked(command::add_wifi_profile(device, ssid)).await?;
        self.checked(command::modify_adhoc(ssid, ip)).await?;
        self.checked(command::connection_up(ssid)).await?;

        log::info!("ad-hoc profile {ssid} is up with {ip}");
        Ok(())
    }

    pub async fn activate(&self, name: &str) -> Result<()> {
        self.checked(command::connection_up(name)).await?;
        Ok(())
    }

    pub async fn deactivate(&self, name: &str) -> Result<()> {
        self.checked(command::connection_down(name)).await?;
        Ok(())
    }

    async fn checked(&self, command: String) -> Result<ShellOutput> {
        let output = self.shell.run(&command).await?;
        if !output.success() {
            return Err(Error::ErrCommandFailed {
                command,
                stderr: output.stderr,
            });
        }
        if !output.stdout.is_empty() {
            log::debug!("{}", output.stdout.trim_end());
        }
        Ok(output)
    }
}
