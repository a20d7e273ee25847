//! The administrative settings surface: what the plugin registers with the
//! host, the settings form it renders, and validation of submitted values.

use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::config::PluginConfig;
use crate::error::Result;
use crate::host::MANAGE_OPTIONS;
use crate::sanitize::sanitize_css;
use crate::settings::Settings;
use crate::viewer::{User, UserId};

pub const ALLOWED_ADMINS_FIELD: &str = "NHider__admin_section___field";
pub const CUSTOM_CSS_FIELD: &str = "NHider__admin_section___custom_css";
pub const CUSTOM_CSS_TEXTAREA: &str = "NHider-custom-css";

const EDITOR_HANDLE: &str = "wp-codemirror";
const EDITOR_SCRIPT_HANDLE: &str = "NHider-script";

const ALLOWED_ADMINS_TITLE: &str = "Allowed Administrators";
const CUSTOM_CSS_TITLE: &str =
    "Doesn't a plugin use the classic way of adding a notice? Use display none in custom css";

const SETTINGS_PAGE: &str = "settings_page";
const ACTION_LINK: &str = "action_link";

/// Page templates, escaped by handlebars on render.
static TEMPLATES: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars
        .register_template_string(SETTINGS_PAGE, include_str!("../templates/settings_page.html.hbs"))
        .expect("settings page template");
    handlebars
        .register_template_string(ACTION_LINK, include_str!("../templates/action_link.html.hbs"))
        .expect("action link template");
    handlebars
});

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct OptionsPage {
    pub page_title: String,
    pub menu_title: String,
    pub capability: String,
    pub menu_slug: String,
}

pub fn options_page(config: &PluginConfig) -> OptionsPage {
    OptionsPage {
        page_title: config.page_title.clone(),
        menu_title: config.menu_title.clone(),
        capability: MANAGE_OPTIONS.to_string(),
        menu_slug: config.menu_slug.clone(),
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SettingsSection {
    pub id: String,
    pub title: String,
    pub page: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SettingsField {
    pub id: String,
    pub title: String,
    pub page: String,
    pub section: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SettingsRegistration {
    pub option_group: String,
    pub option_name: String,
    pub section: SettingsSection,
    pub fields: Vec<SettingsField>,
}

pub fn settings_registration(config: &PluginConfig) -> SettingsRegistration {
    let field = |id: &str, title: &str| SettingsField {
        id: id.to_string(),
        title: title.to_string(),
        page: config.menu_slug.clone(),
        section: config.section_id.clone(),
    };

    SettingsRegistration {
        option_group: config.option_group.clone(),
        option_name: config.option_name.clone(),
        section: SettingsSection {
            id: config.section_id.clone(),
            title: config.section_title.clone(),
            page: config.menu_slug.clone(),
        },
        fields: vec![
            field(ALLOWED_ADMINS_FIELD, ALLOWED_ADMINS_TITLE),
            field(CUSTOM_CSS_FIELD, CUSTOM_CSS_TITLE),
        ],
    }
}

#[derive(Serialize)]
struct ActionLinkContext<'a> {
    url: String,
    label: &'a str,
}

/// Adds the settings link to the plugin's row on the plugins screen.
pub fn plugin_action_links(config: &PluginConfig, mut links: Vec<String>) -> Result<Vec<String>> {
    let link = TEMPLATES.render(
        ACTION_LINK,
        &ActionLinkContext {
            url: config.settings_url(),
            label: "Settings",
        },
    )?;
    links.push(link);
    Ok(links)
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Asset {
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub in_footer: bool,
}

impl Asset {
    fn registered(handle: &str) -> Self {
        Asset {
            handle: handle.to_string(),
            src: None,
            deps: Vec::new(),
            version: None,
            in_footer: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct EditorAssets {
    pub styles: Vec<Asset>,
    pub scripts: Vec<Asset>,
}

/// The code editor is only attached on the plugin's own settings screen.
pub fn editor_assets(config: &PluginConfig, screen_id: Option<&str>) -> EditorAssets {
    if screen_id != Some(config.screen_id.as_str()) {
        return EditorAssets::default();
    }

    EditorAssets {
        styles: vec![Asset::registered(EDITOR_HANDLE)],
        scripts: vec![
            Asset::registered(EDITOR_HANDLE),
            Asset {
                handle: EDITOR_SCRIPT_HANDLE.to_string(),
                src: Some(config.editor_script_url.clone()),
                deps: vec![EDITOR_HANDLE.to_string()],
                version: Some(config.version.clone()),
                in_footer: true,
            },
        ],
    }
}

#[derive(Serialize)]
struct AdministratorCheckbox<'a> {
    id: UserId,
    display_name: &'a str,
    checked: bool,
}

#[derive(Serialize)]
struct SettingsPageContext<'a> {
    logo_url: Option<&'a str>,
    page_title: &'a str,
    option_group: &'a str,
    option_name: &'a str,
    nonce: Option<&'a str>,
    section_title: &'a str,
    admins_title: &'a str,
    administrators: Vec<AdministratorCheckbox<'a>>,
    css_title: &'a str,
    textarea_id: &'a str,
    css: String,
}

/// Renders the settings page form.
///
/// One checkbox per current administrator; the textarea content goes through
/// the same sanitizer as the head injector.
pub fn render_settings_page(
    config: &PluginConfig,
    settings: Option<&Settings>,
    administrators: &[User],
    nonce: Option<&str>,
) -> Result<String> {
    let allowed = settings
        .and_then(|s| s.allowed_admins.as_ref())
        .map(|list| list.ids())
        .unwrap_or_default();
    let css = settings
        .and_then(Settings::custom_css)
        .map(sanitize_css)
        .unwrap_or_default();

    let context = SettingsPageContext {
        logo_url: config.logo_url.as_deref(),
        page_title: &config.page_title,
        option_group: &config.option_group,
        option_name: &config.option_name,
        nonce,
        section_title: &config.section_title,
        admins_title: ALLOWED_ADMINS_TITLE,
        administrators: administrators
            .iter()
            .map(|admin| AdministratorCheckbox {
                id: admin.id,
                display_name: &admin.display_name,
                checked: allowed.contains(&admin.id),
            })
            .collect(),
        css_title: CUSTOM_CSS_TITLE,
        textarea_id: CUSTOM_CSS_TEXTAREA,
        css,
    };

    Ok(TEMPLATES.render(SETTINGS_PAGE, &context)?)
}

/// Reduces a submitted record to what the form could legitimately produce.
///
/// A crafted request can carry any id; only users who currently hold the
/// administrator role survive. Custom CSS is kept verbatim.
pub fn validate_submission(submitted: Settings, administrators: &[User]) -> Settings {
    let current: BTreeSet<UserId> = administrators.iter().map(|u| u.id).collect();

    let allowed_admins = submitted.allowed_admins.map(|list| {
        let (kept, dropped): (Vec<UserId>, Vec<UserId>) =
            list.ids().into_iter().partition(|id| current.contains(id));
        if !dropped.is_empty() {
            warn!(?dropped, "ignoring submitted ids that are not administrators");
        }
        kept.into_iter().collect()
    });

    Settings {
        allowed_admins,
        custom_css: submitted.custom_css,
    }
}
