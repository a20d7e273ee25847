use crate::authorization::is_authorized;
use crate::sanitize::sanitize_css;
use crate::settings::Settings;
use crate::viewer::Viewer;

/// Runs while the admin page head renders. Unauthorized viewers get the stored
/// custom CSS, sanitized, in a style block; everybody else gets nothing.
pub fn on_admin_head(viewer: &Viewer, settings: Option<&Settings>) -> Option<String> {
    if is_authorized(viewer, settings) {
        return None;
    }

    let css = sanitize_css(settings?.custom_css()?);
    if css.trim().is_empty() {
        return None;
    }
    Some(format!("<style type=\"text/css\">{}</style>", css))
}
