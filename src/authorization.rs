use tracing::debug;

use crate::settings::Settings;
use crate::viewer::Viewer;

/// Decides whether `viewer` gets to see dashboard notifications.
///
/// An absent or empty record restricts nobody. Without an allow-list any
/// administrator is trusted; once an allow-list exists it is the only thing
/// that counts, roles included.
pub fn is_authorized(viewer: &Viewer, settings: Option<&Settings>) -> bool {
    let settings = match settings {
        Some(s) if !s.is_empty() => s,
        _ => {
            debug!(%viewer, "no notification settings, everybody is authorized");
            return true;
        }
    };

    if settings.allow_list_is_empty() && viewer.is_administrator() {
        debug!(%viewer, "administrator authorized by role");
        return true;
    }

    if let Some(id) = viewer.id {
        if settings.is_allowed(id) {
            debug!(%viewer, "authorized by allow-list");
            return true;
        }
    }

    debug!(%viewer, "not authorized to see notifications");
    false
}
