//! Collaborators provided by the host platform.
//!
//! Every host facility the plugin consumes sits behind a small trait so the
//! hook handlers can run against an in-memory double. [`WapcHost`] is the real
//! implementation: each call is a waPC `host_call` with a JSON payload.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use tracing::{trace, warn};
#[cfg(target_arch = "wasm32")]
use wapc_guest::prelude::host_call;

use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::viewer::{User, Viewer};

pub const MANAGE_OPTIONS: &str = "manage_options";

/// A host extension point where notification fragments are emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RenderPoint {
    /// Notices scoped to the current admin screen.
    #[serde(rename = "admin_notices")]
    AdminNotices,
    /// Notices shown on every admin screen, network admin included.
    #[serde(rename = "all_admin_notices")]
    AllAdminNotices,
}

impl RenderPoint {
    pub const ALL: [RenderPoint; 2] = [RenderPoint::AdminNotices, RenderPoint::AllAdminNotices];

    pub fn hook_name(self) -> &'static str {
        match self {
            RenderPoint::AdminNotices => "admin_notices",
            RenderPoint::AllAdminNotices => "all_admin_notices",
        }
    }
}

impl fmt::Display for RenderPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hook_name())
    }
}

/// Read/write access to the persisted configuration record.
pub trait SettingsRepository {
    fn get(&self) -> Result<Option<Settings>>;
    fn set(&self, settings: &Settings) -> Result<()>;
}

/// Removes callbacks registered on a render point for the current request.
pub trait NotificationHooks {
    fn clear(&self, point: RenderPoint) -> Result<()>;
}

pub trait UserDirectory {
    fn current_viewer(&self) -> Result<Viewer>;
    fn users_with_role(&self, role: &str) -> Result<Vec<User>>;
}

pub trait CapabilityCheck {
    fn has_capability(&self, viewer: &Viewer, capability: &str) -> bool;
}

/// Host reached through waPC host calls.
pub struct WapcHost {
    binding: String,
    option_name: String,
}

impl WapcHost {
    pub fn new(binding: impl Into<String>, option_name: impl Into<String>) -> Self {
        WapcHost {
            binding: binding.into(),
            option_name: option_name.into(),
        }
    }

    fn call<P, R>(&self, namespace: &str, operation: &str, payload: &P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let raw = self.call_raw(namespace, operation, payload)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn call_raw<P: Serialize>(&self, namespace: &str, operation: &str, payload: &P) -> Result<Vec<u8>> {
        trace!(namespace, operation, "host call");
        let msg = serde_json::to_vec(payload)?;
        host_call(&self.binding, namespace, operation, &msg).map_err(|e| Error::Host {
            namespace: namespace.to_string(),
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }
}

// Native builds (unit tests) have no waPC host to link against.
#[cfg(not(target_arch = "wasm32"))]
fn host_call(
    _binding: &str,
    _namespace: &str,
    _operation: &str,
    _msg: &[u8],
) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error + Sync + Send>> {
    Err("waPC host calls are only available inside a wasm32 guest".into())
}

impl SettingsRepository for WapcHost {
    fn get(&self) -> Result<Option<Settings>> {
        let raw: serde_json::Value = self.call("options", "get", &json!({ "name": self.option_name }))?;
        Settings::from_stored(raw)
    }

    fn set(&self, settings: &Settings) -> Result<()> {
        self.call_raw(
            "options",
            "set",
            &json!({ "name": self.option_name, "value": settings }),
        )?;
        Ok(())
    }
}

impl NotificationHooks for WapcHost {
    fn clear(&self, point: RenderPoint) -> Result<()> {
        self.call_raw("hooks", "remove_all", &json!({ "hook": point }))?;
        Ok(())
    }
}

impl UserDirectory for WapcHost {
    fn current_viewer(&self) -> Result<Viewer> {
        self.call("users", "current", &json!({}))
    }

    fn users_with_role(&self, role: &str) -> Result<Vec<User>> {
        self.call("users", "query", &json!({ "role": role }))
    }
}

impl CapabilityCheck for WapcHost {
    fn has_capability(&self, viewer: &Viewer, capability: &str) -> bool {
        let user_id = match viewer.id {
            Some(id) => id,
            None => return false,
        };
        // a failed lookup denies
        match self.call("users", "can", &json!({ "user_id": user_id, "capability": capability })) {
            Ok(allowed) => allowed,
            Err(error) => {
                warn!(%user_id, capability, %error, "capability check failed, denying");
                false
            }
        }
    }
}
