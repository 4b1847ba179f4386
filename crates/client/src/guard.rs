//! Route guard. A pure function of the snapshot, consulted before any
//! screen renders; it never performs remote calls and never mutates state.

use crate::store::Snapshot;

/// The navigable screens of the client shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Public landing page.
    Landing,
    /// Account-creation form.
    SignUp,
    /// Credential form.
    SignIn,
    /// First-run profile form for a session without a customer profile.
    ProfileSetup,
    /// Authenticated home screen (balance and scan code).
    Home,
    /// Join-a-location screen (scanner plus manual code entry).
    Join,
}

impl Destination {
    /// Destinations that require a recognized login.
    #[must_use]
    pub const fn requires_session(self) -> bool {
        matches!(self, Self::ProfileSetup | Self::Home | Self::Join)
    }

    /// Destinations that only make sense signed out.
    #[must_use]
    pub const fn unauthenticated_only(self) -> bool {
        !self.requires_session()
    }
}

/// What the shell should do with a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The first session resolution has not completed; render a neutral
    /// loading state and decide nothing.
    Pending,
    /// Render the requested destination.
    Allow,
    /// Authenticated destination without a session. The requested
    /// destination is preserved so sign-in can resume the interrupted
    /// navigation (e.g. a scanned join link).
    RedirectToSignIn { return_to: Destination },
    /// Session without a profile; everything funnels into profile setup.
    RedirectToSetup,
    /// Redirect an already-authenticated user off an unauthenticated-only
    /// destination.
    RedirectTo(Destination),
}

/// Decide what to do with a request to navigate to `requested`.
///
/// `pending_return` is a return target captured by an earlier
/// [`RouteDecision::RedirectToSignIn`]; it is honored when the redirect
/// away from an auth form fires, and only if it still requires a session
/// (a stale unauthenticated target falls back to home).
#[must_use]
pub fn evaluate(
    snapshot: &Snapshot,
    requested: Destination,
    pending_return: Option<Destination>,
) -> RouteDecision {
    if snapshot.initializing {
        return RouteDecision::Pending;
    }

    if snapshot.session.is_none() {
        if requested.requires_session() {
            return RouteDecision::RedirectToSignIn {
                return_to: requested,
            };
        }
        return RouteDecision::Allow;
    }

    if snapshot.profile.is_none() {
        if requested == Destination::ProfileSetup {
            return RouteDecision::Allow;
        }
        return RouteDecision::RedirectToSetup;
    }

    // Signed in with a profile. Auth forms and the completed setup form
    // bounce to home, resuming an interrupted navigation if one was
    // captured.
    if requested.unauthenticated_only() || requested == Destination::ProfileSetup {
        let target = pending_return
            .filter(|dest| dest.requires_session() && *dest != Destination::ProfileSetup)
            .unwrap_or(Destination::Home);
        return RouteDecision::RedirectTo(target);
    }

    RouteDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerProfile, Session};

    use beanpass_core::{
        AccountId, Balance, CustomerId, Email, ScanToken,
    };
    use chrono::Utc;
    use secrecy::SecretString;

    fn session() -> Session {
        Session {
            account_id: AccountId::generate(),
            email: Email::parse("ada@example.com").unwrap(),
            access_token: SecretString::from("token"),
        }
    }

    fn profile(session: &Session) -> CustomerProfile {
        CustomerProfile {
            id: CustomerId::generate(),
            account_id: session.account_id,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: session.email.clone(),
            scan_token: ScanToken::generate(),
            balance: Balance::ZERO,
            org_id: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    fn signed_out() -> Snapshot {
        Snapshot {
            initializing: false,
            ..Snapshot::default()
        }
    }

    fn session_only() -> Snapshot {
        Snapshot {
            session: Some(session()),
            initializing: false,
            ..Snapshot::default()
        }
    }

    fn signed_in() -> Snapshot {
        let session = session();
        let profile = profile(&session);
        Snapshot {
            session: Some(session),
            profile: Some(profile),
            saved_locations: Vec::new(),
            initializing: false,
        }
    }

    const ALL: [Destination; 6] = [
        Destination::Landing,
        Destination::SignUp,
        Destination::SignIn,
        Destination::ProfileSetup,
        Destination::Home,
        Destination::Join,
    ];

    #[test]
    fn test_initializing_decides_nothing() {
        let snapshot = Snapshot::default();
        for requested in ALL {
            assert_eq!(evaluate(&snapshot, requested, None), RouteDecision::Pending);
        }
    }

    #[test]
    fn test_signed_out_reaches_public_destinations() {
        let snapshot = signed_out();
        for requested in [Destination::Landing, Destination::SignUp, Destination::SignIn] {
            assert_eq!(evaluate(&snapshot, requested, None), RouteDecision::Allow);
        }
    }

    #[test]
    fn test_signed_out_protected_destination_preserves_return_target() {
        let snapshot = signed_out();
        for requested in [Destination::ProfileSetup, Destination::Home, Destination::Join] {
            assert_eq!(
                evaluate(&snapshot, requested, None),
                RouteDecision::RedirectToSignIn {
                    return_to: requested
                }
            );
        }
    }

    #[test]
    fn test_session_without_profile_is_forced_to_setup() {
        let snapshot = session_only();
        assert_eq!(
            evaluate(&snapshot, Destination::ProfileSetup, None),
            RouteDecision::Allow
        );
        for requested in ALL {
            if requested == Destination::ProfileSetup {
                continue;
            }
            assert_eq!(
                evaluate(&snapshot, requested, None),
                RouteDecision::RedirectToSetup
            );
        }
    }

    #[test]
    fn test_signed_in_reaches_authenticated_destinations() {
        let snapshot = signed_in();
        for requested in [Destination::Home, Destination::Join] {
            assert_eq!(evaluate(&snapshot, requested, None), RouteDecision::Allow);
        }
    }

    #[test]
    fn test_signed_in_bounces_off_auth_forms() {
        let snapshot = signed_in();
        for requested in [
            Destination::Landing,
            Destination::SignUp,
            Destination::SignIn,
            Destination::ProfileSetup,
        ] {
            assert_eq!(
                evaluate(&snapshot, requested, None),
                RouteDecision::RedirectTo(Destination::Home)
            );
        }
    }

    #[test]
    fn test_pending_return_is_honored_after_sign_in() {
        let snapshot = signed_in();
        assert_eq!(
            evaluate(&snapshot, Destination::SignIn, Some(Destination::Join)),
            RouteDecision::RedirectTo(Destination::Join)
        );
    }

    #[test]
    fn test_stale_unauthenticated_return_target_falls_back_to_home() {
        let snapshot = signed_in();
        assert_eq!(
            evaluate(&snapshot, Destination::SignIn, Some(Destination::Landing)),
            RouteDecision::RedirectTo(Destination::Home)
        );
    }
}
