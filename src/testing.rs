use std::cell::RefCell;

use crate::error::{Error, Result};
use crate::host::{CapabilityCheck, NotificationHooks, RenderPoint, SettingsRepository, UserDirectory};
use crate::settings::Settings;
use crate::viewer::{User, UserId, Viewer};

/// In-memory host recording everything the plugin asks of it.
#[derive(Default)]
pub(crate) struct MemoryHost {
    pub viewer: Viewer,
    pub stored: RefCell<Option<Settings>>,
    pub writes: RefCell<usize>,
    pub cleared: RefCell<Vec<RenderPoint>>,
    pub users: Vec<(User, Vec<&'static str>)>,
    pub managers: Vec<UserId>,
    pub fail_writes: bool,
}

impl MemoryHost {
    pub fn new(viewer: Viewer) -> Self {
        MemoryHost {
            viewer,
            ..Default::default()
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.stored = RefCell::new(Some(settings));
        self
    }

    pub fn with_user(mut self, id: u64, display_name: &str, roles: Vec<&'static str>) -> Self {
        self.users.push((
            User {
                id: UserId(id),
                display_name: display_name.to_string(),
            },
            roles,
        ));
        self
    }

    pub fn with_manager(mut self, id: u64) -> Self {
        self.managers.push(UserId(id));
        self
    }
}

impl SettingsRepository for MemoryHost {
    fn get(&self) -> Result<Option<Settings>> {
        Ok(self.stored.borrow().clone())
    }

    fn set(&self, settings: &Settings) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Host {
                namespace: "options".into(),
                operation: "set".into(),
                message: "database is read-only".into(),
            });
        }
        *self.writes.borrow_mut() += 1;
        *self.stored.borrow_mut() = Some(settings.clone());
        Ok(())
    }
}

impl NotificationHooks for MemoryHost {
    fn clear(&self, point: RenderPoint) -> Result<()> {
        self.cleared.borrow_mut().push(point);
        Ok(())
    }
}

impl UserDirectory for MemoryHost {
    fn current_viewer(&self) -> Result<Viewer> {
        Ok(self.viewer.clone())
    }

    fn users_with_role(&self, role: &str) -> Result<Vec<User>> {
        Ok(self
            .users
            .iter()
            .filter(|(_, roles)| roles.iter().any(|r| *r == role))
            .map(|(user, _)| user.clone())
            .collect())
    }
}

impl CapabilityCheck for MemoryHost {
    fn has_capability(&self, viewer: &Viewer, _capability: &str) -> bool {
        viewer.id.map_or(false, |id| self.managers.contains(&id))
    }
}
