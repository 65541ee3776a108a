use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use swann_network::{ProvisioningClient, TransportConfig};

/// Swann smart plug provisioning utility
///
/// A command line application for configuring the home network of the Swann smart plug
/// via its own WiFi access point.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = false)]
struct Cli {
    /// Device socket address
    #[arg(short, long, default_value = "192.168.1.1:2501")]
    address: SocketAddr,
    /// Socket read timeout
    #[arg(
        long = "read-timeout",
        default_value = "15",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    read_timeout: u64,
    /// Fail requests the device does not answer in time
    #[arg(
        long = "response-timeout",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    response_timeout: Option<u64>,
    /// Actual command
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check whether the device answers on its provisioning address
    Reachable {
        /// Probe timeout
        #[arg(short, long = "timeout", default_value = "3000", value_name = "MS")]
        timeout_ms: u64,
    },
    /// Print the device MAC address
    Mac,
    /// Set the home network SSID
    SetSsid {
        /// Network name
        ssid: String,
    },
    /// Set the home network password
    SetPassword {
        /// Network password
        password: String,
    },
    /// Reboot the device so it joins the configured network
    Reboot,
    /// Run the whole pairing flow: check, identify, configure and reboot the device
    Provision {
        /// Network name
        ssid: String,
        /// Network password
        password: String,
        /// Leave the device running on its own access point
        #[arg(long)]
        no_reboot: bool,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate the completions for
        #[arg(value_enum)]
        shell: clap_complete_command::Shell,
    },
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

async fn provision(
    client: &ProvisioningClient,
    ssid: &str,
    password: &str,
    reboot: bool,
) -> anyhow::Result<()> {
    let address = client.config().address;
    anyhow::ensure!(
        client.is_server_reachable(PROBE_TIMEOUT).await,
        "Device {address} is unreachable, make sure this host joined the device access point"
    );

    let mac = client
        .request_mac()
        .await
        .context("Unable to read the device MAC address")?;
    log::info!("Provisioning device {}", format_mac(mac.payload()));

    client
        .set_home_network_ssid(ssid)
        .await
        .context("Unable to set the home network SSID")?;
    log::info!("Home network SSID set to {ssid:?}");

    client
        .set_home_network_password(password)
        .await
        .context("Unable to set the home network password")?;
    log::info!("Home network password set");

    if reboot {
        client
            .request_reboot()
            .await
            .context("Unable to reboot the device")?;
        log::info!("Device {address} is rebooting into the home network");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let address = cli.address;
    let config = TransportConfig {
        read_timeout: Duration::from_secs(cli.read_timeout),
        ..TransportConfig::with_address(address)
    };
    let response_timeout = cli.response_timeout.map(Duration::from_secs);
    let client = ProvisioningClient::with_response_timeout(config, response_timeout);

    match cli.command {
        Command::Reachable { timeout_ms } => {
            let reachable = client
                .is_server_reachable(Duration::from_millis(timeout_ms))
                .await;
            anyhow::ensure!(reachable, "Device {address} is unreachable");
            log::info!("Device {address} is reachable");
        }
        Command::Mac => {
            log::info!("Sending MAC address request to {address}");
            let response = client.request_mac().await?;
            println!("{}", format_mac(response.payload()));
        }
        Command::SetSsid { ssid } => {
            log::info!("Sending home network SSID to {address}");
            client.set_home_network_ssid(&ssid).await?;
        }
        Command::SetPassword { password } => {
            log::info!("Sending home network password to {address}");
            client.set_home_network_password(&password).await?;
        }
        Command::Reboot => {
            log::info!("Sending reboot command to {address}");
            client.request_reboot().await?;
        }
        Command::Provision {
            ssid,
            password,
            no_reboot,
        } => provision(&client, &ssid, &password, !no_reboot).await?,
        Command::Completions { shell } => {
            shell.generate(&mut Cli::command(), &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{format_mac, Cli};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        assert!(Cli::try_parse_from(["swann-cli", "--read-timeout", "0", "mac"]).is_err());
        assert!(Cli::try_parse_from(["swann-cli", "--response-timeout", "0", "mac"]).is_err());

        let cli = Cli::try_parse_from(["swann-cli", "--read-timeout", "1", "mac"]).unwrap();
        assert_eq!(cli.read_timeout, 1);
        assert_eq!(cli.response_timeout, None);
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac(&[0xac, 0xcf, 0x23, 0x01]), "AC:CF:23:01");
        assert_eq!(format_mac(&[]), "");
    }
}
