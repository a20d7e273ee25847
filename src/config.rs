use serde::{Deserialize, Serialize};

/// Names under which the plugin registers itself with the host.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PluginConfig {
    /// waPC binding used for host calls.
    pub binding: String,
    pub version: String,
    pub option_name: String,
    pub option_group: String,
    pub menu_slug: String,
    pub screen_id: String,
    pub page_title: String,
    pub menu_title: String,
    pub section_id: String,
    pub section_title: String,
    /// URL of the settings editor script, as served by the host.
    pub editor_script_url: String,
    /// Plugin logo shown above the settings page title.
    pub logo_url: Option<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        PluginConfig {
            binding: String::from("notifications-hider"),
            version: String::from(env!("CARGO_PKG_VERSION")),
            option_name: String::from("NHider__options"),
            option_group: String::from("NHider__options_group"),
            menu_slug: String::from("NHider"),
            screen_id: String::from("settings_page_NHider"),
            page_title: String::from("Notifications Hider Settings"),
            menu_title: String::from("Notifications Hider"),
            section_id: String::from("NHider__admin_section"),
            section_title: String::from("Administrators Access Settings"),
            editor_script_url: String::from("assets/notifications-hider.js"),
            logo_url: None,
        }
    }
}

impl PluginConfig {
    pub fn settings_url(&self) -> String {
        format!("options-general.php?page={}", self.menu_slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_overrides_keep_defaults() -> anyhow::Result<()> {
        let config: PluginConfig = serde_json::from_value(json!({"menu_slug": "hider"}))?;

        assert_eq!(config.menu_slug, "hider");
        assert_eq!(config.option_name, "NHider__options");
        assert_eq!(config.settings_url(), "options-general.php?page=hider");

        Ok(())
    }
}
