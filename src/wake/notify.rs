use std::cell::RefCell;

pub const WAKE_TITLE: &str = "vTasks Wake Up!";

pub fn wake_body(title: &str) -> String {
    format!("Item \"{}\" is now active.", title)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Not asked yet.
    #[default]
    Default,
}

/// Delivery of user notifications. Callers only notify once permission is
/// `Granted`; anything else makes a wake silent.
pub trait Notifier {
    fn permission(&self) -> NotificationPermission;
    fn request_permission(&mut self) -> NotificationPermission;
    fn notify(&self, title: &str, body: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    enabled: bool,
}

impl LogNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for LogNotifier {
    fn permission(&self) -> NotificationPermission {
        if self.enabled {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        }
    }

    fn request_permission(&mut self) -> NotificationPermission {
        self.permission()
    }

    fn notify(&self, title: &str, body: &str) {
        log::info!("{}: {}", title, body);
    }
}

/// Records notifications in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    permission: NotificationPermission,
    /// What a permission request resolves to.
    answer: NotificationPermission,
    sent: RefCell<Vec<(String, String)>>,
}

impl MemoryNotifier {
    pub fn granted() -> Self {
        Self::with_permission(NotificationPermission::Granted, NotificationPermission::Granted)
    }

    pub fn with_permission(permission: NotificationPermission, answer: NotificationPermission) -> Self {
        Self {
            permission,
            answer,
            sent: RefCell::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }
}

impl Notifier for MemoryNotifier {
    fn permission(&self) -> NotificationPermission {
        self.permission
    }

    fn request_permission(&mut self) -> NotificationPermission {
        if self.permission == NotificationPermission::Default {
            self.permission = self.answer;
        }
        self.permission
    }

    fn notify(&self, title: &str, body: &str) {
        self.sent
            .borrow_mut()
            .push((title.to_string(), body.to_string()));
    }
}
