// Uplink state: toggle both interfaces, or read whether both are enabled.

use tracing::debug;

use routerctl_api::models::Interface;
use routerctl_api::{Command, RouterApi};

use super::execute_command;
use crate::error::{CoreError, DataIntegrityError};
use crate::progress::{self, Progress};
use crate::settings::NetworkInterfaces;

fn set_disabled(name: &str, enable: bool) -> Command {
    Command::builder("/interface/set")
        .attribute("disabled", (!enable).to_string())
        .attribute(".id", name)
        .build()
}

fn print_status(interfaces: &NetworkInterfaces) -> Command {
    Command::builder("/interface/print")
        .proplist(&["disabled"])
        .query("name", interfaces.pppoe.as_str())
        .query("name", interfaces.ether.as_str())
        .query_operation("|")
        .build()
}

/// Set `disabled=<!enable>` on the PPPoE interface, then on the Ethernet one.
/// The first failure stops the sequence.
pub(super) async fn change_state<A: RouterApi>(
    api: &mut A,
    interfaces: &NetworkInterfaces,
    enable: bool,
    progress: Option<&dyn Progress>,
) -> Result<(), CoreError> {
    let verb = if enable { "Enabling" } else { "Disabling" };

    for name in [&interfaces.pppoe, &interfaces.ether] {
        progress::report(progress, &format!("{verb} interface {name}..."));

        execute_command(api, &set_disabled(name, enable))
            .await
            .inspect_err(|_| progress::report(progress, "Command error."))?;

        progress::report(progress, "Command executed.");
        debug!(interface = %name, enable, "interface state changed");
    }

    Ok(())
}

/// `true` when neither uplink is disabled.
pub(super) async fn request_status<A: RouterApi>(
    api: &mut A,
    interfaces: &NetworkInterfaces,
) -> Result<bool, CoreError> {
    let command = print_status(interfaces);
    let rows: Vec<Interface> = api.execute_to_list(&command).await.map_err(|source| {
        CoreError::CommandFailed {
            command: command.to_string(),
            source,
        }
    })?;

    let [first, second] = rows.as_slice() else {
        return Err(DataIntegrityError::UnexpectedRowCount {
            expected: "2",
            actual: rows.len(),
        }
        .into());
    };

    let disabled = |row: &Interface| {
        row.disabled.ok_or(DataIntegrityError::MissingField {
            field: "disabled",
            model: "Interface",
        })
    };
    let (first, second) = (disabled(first)?, disabled(second)?);
    let all_enabled = !first && !second;

    debug!(all_enabled, "interfaces status read");
    Ok(all_enabled)
}
