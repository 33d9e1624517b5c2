//! Wire model for the subset of the Compute Engine v1 API the connector uses.

use serde::{Deserialize, Serialize};

/// Terminal status reported for a finished zone operation.
pub const OPERATION_DONE: &str = "DONE";

/// Request body for a boot disk insert.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSpec {
    /// Disk name; the connector always uses the instance name.
    pub name: String,
    /// Fully-qualified source image URL. Left absent when the image key is
    /// unknown so the provider rejects the insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
}

/// A long-running provider-side operation returned by insert and delete calls.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation name used for status polling.
    pub name: String,
    /// Provider status string, `DONE` once terminal.
    pub status: String,
}

impl Operation {
    /// Whether the operation has reached its terminal status.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == OPERATION_DONE
    }
}

/// Request body for an instance insert.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSpec {
    /// Instance name.
    pub name: String,
    /// Fully-qualified machine type URL.
    pub machine_type: String,
    /// Target zone.
    pub zone: String,
    /// Network interfaces; the connector always attaches exactly one.
    pub network_interfaces: Vec<NetworkInterface>,
    /// Attached disks; the connector always attaches the boot disk only.
    pub disks: Vec<AttachedDisk>,
}

/// An instance as reported by the provider.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Instance name.
    pub name: String,
    /// Provider status string (`RUNNING`, `PROVISIONING`, ...).
    pub status: String,
    /// Network interfaces with their access configs.
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

/// One network interface on an instance.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    /// Interface name.
    pub name: String,
    /// Fully-qualified network URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Access configs granting external connectivity.
    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

/// External access configuration on a network interface.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    /// Access config name.
    pub name: String,
    /// Access config type.
    #[serde(rename = "type")]
    pub kind: String,
    /// External NAT IP, once assigned.
    #[serde(rename = "natIP", skip_serializing_if = "Option::is_none")]
    pub nat_ip: Option<String>,
}

/// A disk attachment within an instance spec.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    /// Whether this is the boot disk.
    pub boot: bool,
    /// Disk type; always `PERSISTENT` for the boot disk.
    #[serde(rename = "type")]
    pub kind: String,
    /// Attachment mode; always `READ_WRITE` for the boot disk.
    pub mode: String,
    /// Device name exposed to the guest; the instance name.
    pub device_name: String,
    /// Fully-qualified URL of the source disk.
    pub source: String,
}

/// A project as returned by the validation read.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::Operation;

    #[test]
    fn operation_is_done_only_on_terminal_status() {
        let pending = Operation {
            name: "op-1".to_owned(),
            status: "RUNNING".to_owned(),
        };
        let done = Operation {
            name: "op-1".to_owned(),
            status: "DONE".to_owned(),
        };
        assert!(!pending.is_done());
        assert!(done.is_done());
    }
}
