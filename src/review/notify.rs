use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A dismissable user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Displays notices. Fire-and-forget from the caller's side.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Supplies the signed-in admin, if any.
pub trait AdminIdentity: Send + Sync {
    fn current_admin(&self) -> Option<Uuid>;
}

/// Identity fixed at construction, e.g. from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAdmin(pub Option<Uuid>);

impl AdminIdentity for StaticAdmin {
    fn current_admin(&self) -> Option<Uuid> {
        self.0
    }
}
