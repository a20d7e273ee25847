extern crate wapc_guest as guest;
use guest::prelude::*;

use anyhow::anyhow;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

pub mod admin;
pub mod authorization;
pub mod config;
pub mod error;
pub mod host;
pub mod plugin;
pub mod sanitize;
pub mod settings;
pub mod style;
pub mod suppression;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

use config::PluginConfig;
use host::WapcHost;
use plugin::NotificationsHider;
use settings::Settings;

static PLUGIN: OnceCell<NotificationsHider<WapcHost>> = OnceCell::new();

fn build(config: PluginConfig) -> NotificationsHider<WapcHost> {
    let host = WapcHost::new(config.binding.as_str(), config.option_name.as_str());
    NotificationsHider::new(config, host)
}

fn plugin() -> &'static NotificationsHider<WapcHost> {
    PLUGIN.get_or_init(|| build(PluginConfig::default()))
}

#[derive(Deserialize, Serialize, Debug, Default)]
struct EnqueueRequest {
    #[serde(default)]
    screen_id: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
struct ActionLinks {
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
struct SettingsPageRequest {
    #[serde(default)]
    nonce: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
struct HtmlResponse {
    html: Option<String>,
}

#[no_mangle]
pub extern "C" fn wapc_init() {
    register_function("configure", configure);
    register_function("admin_init", admin_init);
    register_function("admin_head", admin_head);
    register_function("admin_menu", admin_menu);
    register_function("register_settings", register_settings);
    register_function("enqueue_assets", enqueue_assets);
    register_function("plugin_action_links", plugin_action_links);
    register_function("settings_page", settings_page);
    register_function("save_settings", save_settings);
}

fn decode<'a, T>(operation: &str, payload: &'a [u8]) -> std::result::Result<T, anyhow::Error>
where
    T: Deserialize<'a> + Default,
{
    if payload.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(payload).map_err(|e| {
        anyhow!(
            "Error decoding {} payload {}: {:?}",
            operation,
            String::from_utf8_lossy(payload),
            e
        )
    })
}

fn respond<T: Serialize>(response: &T) -> CallResult {
    Ok(serde_json::to_vec(response)?)
}

/// Replaces the default configuration; only possible before the first hook runs.
fn configure(payload: &[u8]) -> CallResult {
    let config: PluginConfig = decode("configure", payload)?;
    if PLUGIN.set(build(config)).is_err() {
        return Err(anyhow!("plugin already initialized, configure must be the first call").into());
    }
    respond(&plugin().config())
}

fn admin_init(_: &[u8]) -> CallResult {
    respond(&plugin().admin_init()?)
}

fn admin_head(_: &[u8]) -> CallResult {
    respond(&HtmlResponse {
        html: plugin().admin_head()?,
    })
}

fn admin_menu(_: &[u8]) -> CallResult {
    respond(&plugin().admin_menu())
}

fn register_settings(_: &[u8]) -> CallResult {
    respond(&plugin().register_settings())
}

fn enqueue_assets(payload: &[u8]) -> CallResult {
    let req: EnqueueRequest = decode("enqueue_assets", payload)?;
    respond(&plugin().enqueue_assets(req.screen_id.as_deref()))
}

fn plugin_action_links(payload: &[u8]) -> CallResult {
    let req: ActionLinks = decode("plugin_action_links", payload)?;
    respond(&ActionLinks {
        links: plugin().plugin_action_links(req.links)?,
    })
}

fn settings_page(payload: &[u8]) -> CallResult {
    let req: SettingsPageRequest = decode("settings_page", payload)?;
    respond(&HtmlResponse {
        html: Some(plugin().settings_page(req.nonce.as_deref())?),
    })
}

fn save_settings(payload: &[u8]) -> CallResult {
    let submitted: Settings = decode("save_settings", payload)?;
    respond(&plugin().save_settings(submitted)?)
}
