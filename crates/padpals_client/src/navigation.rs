//! Typed view navigation with role guards.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionContext;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Home,
    Shop,
    Tracker,
    Profile,
    Cart,
    Checkout,
    Admin,
    AdminApply,
    SuperAdmin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    SuperAdmin,
}

impl View {
    /// Entry view for a deep-link path, if the path names one.
    pub fn from_path(path: &str) -> Option<View> {
        match path.trim_end_matches('/') {
            "" => Some(View::Home),
            "/admin/request" => Some(View::AdminApply),
            _ => None,
        }
    }

    pub fn required_role(self) -> Option<Role> {
        match self {
            View::Admin => Some(Role::Admin),
            View::SuperAdmin => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

impl Role {
    pub fn is_held_by(self, session: &SessionContext) -> bool {
        match self {
            Role::Admin => session.is_admin(),
            Role::SuperAdmin => session.is_super_admin(),
        }
    }

    /// Fail unless the session holds this role.
    pub fn require(self, session: &SessionContext) -> Result<(), NavigationError> {
        if self.is_held_by(session) {
            Ok(())
        } else {
            Err(NavigationError::RoleRequired(self))
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("{view:?} requires {role:?} access")]
    Forbidden { view: View, role: Role },
    #[error("{0:?} access required")]
    RoleRequired(Role),
    #[error("sign in required")]
    SignInRequired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Transition {
    pub from: View,
    pub to: View,
}

#[derive(Clone, Debug, Default)]
pub struct Navigator {
    current: View,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start on the view a deep-link path selects, else Home.
    pub fn starting_at(path: &str) -> Self {
        Self {
            current: View::from_path(path).unwrap_or_default(),
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn navigate(
        &mut self,
        to: View,
        session: &SessionContext,
    ) -> Result<Transition, NavigationError> {
        if let Some(role) = to.required_role().filter(|r| !r.is_held_by(session)) {
            return Err(NavigationError::Forbidden { view: to, role });
        }
        Ok(self.move_to(to))
    }

    /// The profile page's admin button: super admins get their own panel.
    pub fn admin_entry(&mut self, session: &SessionContext) -> Result<Transition, NavigationError> {
        let to = if session.is_super_admin() {
            View::SuperAdmin
        } else {
            View::Admin
        };
        self.navigate(to, session)
    }

    /// Send a guest to the profile view to sign in.
    pub fn redirect_to_login(&mut self) -> Transition {
        self.move_to(View::Profile)
    }

    fn move_to(&mut self, to: View) -> Transition {
        let t = Transition {
            from: self.current,
            to,
        };
        tracing::debug!(from = ?t.from, to = ?t.to, "navigation");
        self.current = to;
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserSession;

    fn user(is_admin: bool, is_super_admin: bool) -> SessionContext {
        SessionContext::signed_in(UserSession {
            id: "u".into(),
            name: String::new(),
            email: String::new(),
            is_admin,
            is_super_admin,
        })
    }

    #[test]
    fn plain_views_are_open_to_guests() {
        let mut nav = Navigator::new();
        let t = nav.navigate(View::Tracker, &SessionContext::guest()).unwrap();
        assert_eq!(
            t,
            Transition {
                from: View::Home,
                to: View::Tracker
            }
        );
        assert_eq!(nav.current(), View::Tracker);
    }

    #[test]
    fn admin_view_requires_admin() {
        let mut nav = Navigator::new();
        let err = nav.navigate(View::Admin, &user(false, false)).unwrap_err();
        assert_eq!(
            err,
            NavigationError::Forbidden {
                view: View::Admin,
                role: Role::Admin
            }
        );
        assert_eq!(nav.current(), View::Home);
        assert!(nav.navigate(View::Admin, &user(true, false)).is_ok());
    }

    #[test]
    fn admin_entry_picks_panel_by_role() {
        let mut nav = Navigator::new();
        assert_eq!(nav.admin_entry(&user(true, true)).unwrap().to, View::SuperAdmin);
        assert_eq!(nav.admin_entry(&user(true, false)).unwrap().to, View::Admin);
        assert!(nav.admin_entry(&SessionContext::guest()).is_err());
    }

    #[test]
    fn admin_request_path_opens_application_form() {
        assert_eq!(Navigator::starting_at("/admin/request").current(), View::AdminApply);
        assert_eq!(Navigator::starting_at("/elsewhere").current(), View::Home);
    }

    #[test]
    fn role_requirements() {
        assert!(Role::Admin.require(&user(false, true)).is_ok());
        assert_eq!(
            Role::SuperAdmin.require(&user(true, false)),
            Err(NavigationError::RoleRequired(Role::SuperAdmin))
        );
        assert!(Role::Admin.require(&SessionContext::guest()).is_err());
    }

    #[test]
    fn login_redirect_lands_on_profile() {
        let mut nav = Navigator::new();
        nav.navigate(View::Checkout, &SessionContext::guest()).unwrap();
        let t = nav.redirect_to_login();
        assert_eq!(t.from, View::Checkout);
        assert_eq!(nav.current(), View::Profile);
    }
}
