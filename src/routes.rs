//! Page surface of the portal: route paths and the role-gating metadata
//! the session guard consumes. No CLI and no local state live behind these;
//! marketing pages are plain public routes.

use serde::{Deserialize, Serialize};

use crate::models::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Home,
    About,
    Pricing,
    Faq,
    Testimonials,
    SignIn,
    SignUp,
    Consultation,
    PatientDashboard,
    DoctorDashboard,
    ConsultationDetail { id: String },
    Profile,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".into(),
            Self::About => "/about".into(),
            Self::Pricing => "/pricing".into(),
            Self::Faq => "/faq".into(),
            Self::Testimonials => "/testimonials".into(),
            Self::SignIn => "/sign-in".into(),
            Self::SignUp => "/sign-up".into(),
            Self::Consultation => "/consultation".into(),
            Self::PatientDashboard => "/dashboard/patient".into(),
            Self::DoctorDashboard => "/dashboard/doctor".into(),
            Self::ConsultationDetail { id } => {
                format!("/dashboard/doctor/consultation/{id}")
            }
            Self::Profile => "/profile".into(),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Self::Home),
            "/about" => Some(Self::About),
            "/pricing" => Some(Self::Pricing),
            "/faq" => Some(Self::Faq),
            "/testimonials" => Some(Self::Testimonials),
            "/sign-in" => Some(Self::SignIn),
            "/sign-up" => Some(Self::SignUp),
            "/consultation" => Some(Self::Consultation),
            "/dashboard/patient" => Some(Self::PatientDashboard),
            "/dashboard/doctor" => Some(Self::DoctorDashboard),
            "/profile" => Some(Self::Profile),
            other => {
                let id = other.strip_prefix("/dashboard/doctor/consultation/")?;
                if id.is_empty() || id.contains('/') {
                    return None;
                }
                Some(Self::ConsultationDetail { id: id.to_string() })
            }
        }
    }

    /// Role a visitor must hold to see this route, or None for public pages
    /// (Profile requires sign-in but accepts either role).
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Self::Consultation | Self::PatientDashboard => Some(Role::Patient),
            Self::DoctorDashboard | Self::ConsultationDetail { .. } => Some(Role::Doctor),
            _ => None,
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Profile) || self.required_role().is_some()
    }

    /// Landing dashboard for a signed-in role.
    pub fn dashboard_for(role: Role) -> Self {
        match role {
            Role::Patient => Self::PatientDashboard,
            Role::Doctor => Self::DoctorDashboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_round_trip() {
        let routes = [
            Route::Home,
            Route::About,
            Route::Pricing,
            Route::Faq,
            Route::Testimonials,
            Route::SignIn,
            Route::SignUp,
            Route::Consultation,
            Route::PatientDashboard,
            Route::DoctorDashboard,
            Route::ConsultationDetail { id: "consult-1".into() },
            Route::Profile,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route.clone()));
        }
    }

    #[test]
    fn parse_rejects_unknown_paths() {
        assert_eq!(Route::parse("/admin"), None);
        assert_eq!(Route::parse("/dashboard/doctor/consultation/"), None);
        assert_eq!(Route::parse("/dashboard/doctor/consultation/a/b"), None);
    }

    #[test]
    fn role_gating() {
        assert_eq!(Route::PatientDashboard.required_role(), Some(Role::Patient));
        assert_eq!(Route::DoctorDashboard.required_role(), Some(Role::Doctor));
        assert_eq!(Route::Home.required_role(), None);
        assert!(Route::Profile.requires_auth());
        assert!(!Route::Pricing.requires_auth());
    }

    #[test]
    fn dashboard_for_role() {
        assert_eq!(Route::dashboard_for(Role::Patient), Route::PatientDashboard);
        assert_eq!(Route::dashboard_for(Role::Doctor), Route::DoctorDashboard);
    }
}
