//! Session/redirect state machine.
//!
//! Decides where a signed-in identity lands. Navigation is purely derived
//! from the resolved auth state; the single retried operation is the
//! profile lookup, retried at most once per identity:
//!
//! - no session: stay put, internal state resets
//! - resolution in flight: stay put
//! - resolved with a role: navigate to the role's home unless the current
//!   path is already under it (prevents bouncing off sub-pages like
//!   `/student/profile`)
//! - resolved without a role, first time for this identity: request one
//!   resolver retry (covers backend propagation delay right after
//!   sign-up), optionally with a provisional destination from the cached
//!   last-login hint
//! - resolved without a role after the retry: the session is orphaned -
//!   force sign-out and land on `/`

use clearpath_types::profile::Role;
use clearpath_types::session::{LoginKind, Session};

/// Landing page.
pub const HOME_PATH: &str = "/";
/// Role home paths.
pub const STUDENT_HOME: &str = "/student";
pub const DEPARTMENT_HOME: &str = "/department";
pub const ADMIN_HOME: &str = "/admin";

/// Home path for a resolved role.
pub fn home_path(role: Role) -> &'static str {
    match role {
        Role::Student => STUDENT_HOME,
        Role::Department => DEPARTMENT_HOME,
        Role::Admin => ADMIN_HOME,
    }
}

fn hint_home(kind: LoginKind) -> &'static str {
    match kind {
        LoginKind::Student => STUDENT_HOME,
        LoginKind::Department => DEPARTMENT_HOME,
        LoginKind::Admin => ADMIN_HOME,
    }
}

/// True when `path` is the prefix itself or one of its sub-pages.
fn under(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

/// Snapshot of the auth state the controller decides over.
#[derive(Clone, Debug)]
pub struct AuthView<'a> {
    pub session: Option<&'a Session>,
    /// True while resolution is in flight.
    pub loading: bool,
    /// The resolved role, absent when resolution found no profile.
    pub role: Option<Role>,
    /// Cached last-login hint, if any.
    pub hint: Option<LoginKind>,
}

/// What the caller should do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// No navigation.
    Stay,
    /// Navigate to the given path.
    Navigate(&'static str),
    /// Re-run the resolver once; optionally navigate provisionally from
    /// the hint while waiting. The resolver's next result always wins.
    RetryResolve { provisional: Option<&'static str> },
    /// Orphaned session: sign out and land on the home path.
    SignOut,
}

/// The redirect controller. One per daemon; its retry flag is keyed to the
/// session identity and resets whenever the identity changes.
#[derive(Debug, Default)]
pub struct SessionController {
    identity: Option<String>,
    retry_attempted: bool,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide the next action for the current auth state and path.
    pub fn decide(&mut self, view: &AuthView<'_>, current_path: &str) -> Decision {
        let Some(session) = view.session else {
            self.identity = None;
            self.retry_attempted = false;
            return Decision::Stay;
        };

        if self.identity.as_deref() != Some(session.user_id.as_str()) {
            self.identity = Some(session.user_id.clone());
            self.retry_attempted = false;
        }

        if view.loading {
            return Decision::Stay;
        }

        match view.role {
            Some(role) => {
                let home = home_path(role);
                if under(current_path, home) {
                    Decision::Stay
                } else {
                    Decision::Navigate(home)
                }
            }
            None if !self.retry_attempted => {
                self.retry_attempted = true;
                let provisional = view
                    .hint
                    .map(hint_home)
                    .filter(|home| !under(current_path, home));
                Decision::RetryResolve { provisional }
            }
            None => Decision::SignOut,
        }
    }
}
