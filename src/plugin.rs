use tracing::info;

use crate::admin::{self, EditorAssets, OptionsPage, SettingsRegistration};
use crate::config::PluginConfig;
use crate::error::{Error, Result};
use crate::host::{CapabilityCheck, NotificationHooks, SettingsRepository, UserDirectory, MANAGE_OPTIONS};
use crate::settings::Settings;
use crate::style;
use crate::suppression::{self, SuppressionOutcome};
use crate::viewer::ADMINISTRATOR_ROLE;

/// Everything the plugin needs from its host.
pub trait Host: SettingsRepository + NotificationHooks + UserDirectory + CapabilityCheck {}

impl<T> Host for T where T: SettingsRepository + NotificationHooks + UserDirectory + CapabilityCheck {}

/// The plugin service: built once, then handed to every hook handler.
pub struct NotificationsHider<H> {
    config: PluginConfig,
    host: H,
}

impl<H: Host> NotificationsHider<H> {
    pub fn new(config: PluginConfig, host: H) -> Self {
        NotificationsHider { config, host }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn admin_init(&self) -> Result<SuppressionOutcome> {
        let viewer = self.host.current_viewer()?;
        let settings = self.host.get()?;
        suppression::on_admin_init(&viewer, settings.as_ref(), &self.host)
    }

    pub fn admin_head(&self) -> Result<Option<String>> {
        let viewer = self.host.current_viewer()?;
        let settings = self.host.get()?;
        Ok(style::on_admin_head(&viewer, settings.as_ref()))
    }

    pub fn admin_menu(&self) -> OptionsPage {
        admin::options_page(&self.config)
    }

    pub fn register_settings(&self) -> SettingsRegistration {
        admin::settings_registration(&self.config)
    }

    pub fn enqueue_assets(&self, screen_id: Option<&str>) -> EditorAssets {
        admin::editor_assets(&self.config, screen_id)
    }

    pub fn plugin_action_links(&self, links: Vec<String>) -> Result<Vec<String>> {
        admin::plugin_action_links(&self.config, links)
    }

    pub fn settings_page(&self, nonce: Option<&str>) -> Result<String> {
        self.require_manager()?;
        let settings = self.host.get()?;
        let administrators = self.host.users_with_role(ADMINISTRATOR_ROLE)?;
        admin::render_settings_page(&self.config, settings.as_ref(), &administrators, nonce)
    }

    /// Validates a submitted record against the live administrator list and
    /// stores it in a single write.
    pub fn save_settings(&self, submitted: Settings) -> Result<Settings> {
        let viewer = self.require_manager()?;
        let administrators = self.host.users_with_role(ADMINISTRATOR_ROLE)?;
        let settings = admin::validate_submission(submitted, &administrators);
        self.host.set(&settings)?;
        info!(%viewer, option = %self.config.option_name, "notification settings saved");
        Ok(settings)
    }

    fn require_manager(&self) -> Result<crate::viewer::Viewer> {
        let viewer = self.host.current_viewer()?;
        if !self.host.has_capability(&viewer, MANAGE_OPTIONS) {
            return Err(Error::Forbidden {
                user: viewer.to_string(),
                capability: MANAGE_OPTIONS.to_string(),
            });
        }
        Ok(viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RenderPoint;
    use crate::testing::MemoryHost;
    use crate::viewer::{UserId, Viewer};
    use serde_json::json;

    fn site(viewer: Viewer) -> MemoryHost {
        MemoryHost::new(viewer)
            .with_user(1, "Alice", vec!["administrator"])
            .with_user(4, "Bob", vec!["administrator"])
            .with_user(7, "Eve", vec!["editor"])
            .with_manager(1)
            .with_manager(4)
    }

    fn plugin(host: MemoryHost) -> NotificationsHider<MemoryHost> {
        NotificationsHider::new(PluginConfig::default(), host)
    }

    #[test]
    fn fresh_install_restricts_nobody() -> anyhow::Result<()> {
        let hider = plugin(site(Viewer::new(7, vec!["editor"])));

        assert!(hider.admin_init()?.authorized);
        assert_eq!(hider.admin_head()?, None);
        assert!(hider.host.cleared.borrow().is_empty());

        Ok(())
    }

    #[test]
    fn save_then_restrict() -> anyhow::Result<()> {
        let hider = plugin(site(Viewer::new(1, vec!["administrator"])));
        let submitted: Settings = serde_json::from_value(json!({
            "allowed_admins": ["1"],
            "custom_css": ".notice{display:none}"
        }))?;

        hider.save_settings(submitted)?;
        assert_eq!(*hider.host.writes.borrow(), 1);
        assert!(hider.admin_init()?.authorized);

        let other_admin = NotificationsHider::new(
            PluginConfig::default(),
            site(Viewer::new(4, vec!["administrator"])).with_settings(hider.host.get()?.unwrap_or_default()),
        );
        let outcome = other_admin.admin_init()?;
        assert!(!outcome.authorized);
        assert_eq!(outcome.cleared, RenderPoint::ALL.to_vec());
        assert_eq!(
            other_admin.admin_head()?.as_deref(),
            Some("<style type=\"text/css\">.notice{display:none}</style>")
        );

        Ok(())
    }

    #[test]
    fn save_requires_manage_options() -> anyhow::Result<()> {
        let hider = plugin(site(Viewer::new(7, vec!["editor"])));

        let err = hider.save_settings(Settings::default()).unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
        assert_eq!(*hider.host.writes.borrow(), 0);
        assert!(hider.settings_page(None).is_err());

        Ok(())
    }

    #[test]
    fn save_drops_ids_of_non_administrators() -> anyhow::Result<()> {
        let hider = plugin(site(Viewer::new(1, vec!["administrator"])));
        let submitted: Settings = serde_json::from_value(json!({"allowed_admins": ["4", "7", "1234"]}))?;

        let stored = hider.save_settings(submitted)?;

        assert_eq!(
            stored.allowed_admins.map(|l| l.ids().into_iter().collect::<Vec<_>>()),
            Some(vec![UserId(4)])
        );

        Ok(())
    }

    #[test]
    fn failed_write_is_reported() {
        let mut host = site(Viewer::new(1, vec!["administrator"]));
        host.fail_writes = true;
        let hider = plugin(host);

        match hider.save_settings(Settings::default()) {
            Err(Error::Host { operation, .. }) => assert_eq!(operation, "set"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn settings_page_lists_current_administrators() -> anyhow::Result<()> {
        let hider = plugin(site(Viewer::new(4, vec!["administrator"])));

        let html = hider.settings_page(Some("n0nce"))?;

        assert!(html.contains(">Alice</label>"));
        assert!(html.contains(">Bob</label>"));
        assert!(!html.contains("Eve"));

        Ok(())
    }
}
