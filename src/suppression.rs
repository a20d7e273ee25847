use serde::{Deserialize, Serialize};
use tracing::info;

use crate::authorization::is_authorized;
use crate::error::Result;
use crate::host::{NotificationHooks, RenderPoint};
use crate::settings::Settings;
use crate::viewer::Viewer;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SuppressionOutcome {
    pub authorized: bool,
    pub cleared: Vec<RenderPoint>,
}

/// Runs on admin initialization: unauthorized viewers lose every callback
/// registered on both notification render points for this request.
pub fn on_admin_init<H>(viewer: &Viewer, settings: Option<&Settings>, hooks: &H) -> Result<SuppressionOutcome>
where
    H: NotificationHooks + ?Sized,
{
    if is_authorized(viewer, settings) {
        return Ok(SuppressionOutcome {
            authorized: true,
            cleared: Vec::new(),
        });
    }

    let mut cleared = Vec::with_capacity(RenderPoint::ALL.len());
    for point in RenderPoint::ALL.iter().copied() {
        hooks.clear(point)?;
        cleared.push(point);
    }
    info!(%viewer, "notifications suppressed");

    Ok(SuppressionOutcome {
        authorized: false,
        cleared,
    })
}
