//! Drives the root routing machine for one request.
//!
//! The cookie session stands in for the client's stored session: it is
//! refreshed when its token has expired, checked against the gateway, and
//! then the signed-in user's profile decides which view renders.

use chrono::Utc;
use tracing::{debug, instrument, warn};

use sparepart_nexus_core::{Profile, ProfileLookup, RootRouter, RouteState, RouterAction, RouterEvent};

use crate::gateway::{Gateway, GatewayError};
use crate::models::CurrentSession;

/// Outcome of checking a stored session's token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    /// Token still within its lifetime.
    Valid(CurrentSession),
    /// Token had expired and was exchanged for a new one.
    Refreshed(CurrentSession),
    /// Token had expired and could not be refreshed.
    Expired,
}

/// How the stored session should change after resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Unchanged,
    Replaced(CurrentSession),
    Cleared,
}

/// Everything the root view needs.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub state: RouteState,
    /// The session the page renders for, after any refresh.
    pub session: Option<CurrentSession>,
    pub profile: Option<Profile>,
    pub change: SessionChange,
}

/// Refresh the session if its access token has expired.
pub async fn check_session(gateway: &dyn Gateway, current: CurrentSession) -> SessionCheck {
    if !current.is_expired(Utc::now()) {
        return SessionCheck::Valid(current);
    }

    match gateway.refresh_session(&current.refresh_token).await {
        Ok(session) => {
            debug!(user_id = %current.user_id, "Session refreshed");
            SessionCheck::Refreshed(CurrentSession::from(&session))
        }
        Err(e) => {
            warn!(user_id = %current.user_id, error = %e, "Session refresh failed");
            SessionCheck::Expired
        }
    }
}

/// Resolve the view for a request carrying `stored` (if any).
#[instrument(skip_all, fields(user_id = stored.as_ref().map(|s| s.user_id.to_string())))]
pub async fn resolve(gateway: &dyn Gateway, stored: Option<CurrentSession>) -> Resolution {
    let mut router = RootRouter::new();

    let Some(stored) = stored else {
        drive(&mut router, gateway, None, RouterEvent::SessionResolved(None)).await;
        return Resolution {
            state: router.state(),
            session: None,
            profile: None,
            change: SessionChange::Unchanged,
        };
    };

    let (session, mut change) = match check_session(gateway, stored).await {
        SessionCheck::Valid(session) => (Some(session), SessionChange::Unchanged),
        SessionCheck::Refreshed(session) => {
            (Some(session.clone()), SessionChange::Replaced(session))
        }
        SessionCheck::Expired => (None, SessionChange::Cleared),
    };

    let session = match session {
        Some(session) => confirm_user(gateway, session).await,
        None => None,
    };
    if session.is_none() {
        change = SessionChange::Cleared;
    }

    // A refresh or expiry is an auth change; otherwise this is the initial lookup.
    let user_id = session.as_ref().map(|s| s.user_id);
    let event = if change == SessionChange::Unchanged {
        RouterEvent::SessionResolved(user_id)
    } else {
        RouterEvent::AuthChanged(user_id)
    };
    drive(&mut router, gateway, session.as_ref(), event).await;

    Resolution {
        state: router.state(),
        profile: router.profile().cloned(),
        session,
        change,
    }
}

/// Look the profile up again after setup wrote one, and return the view it
/// routes to.
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn route_after_setup(gateway: &dyn Gateway, session: &CurrentSession) -> RouteState {
    let mut router = RootRouter::awaiting_profile(session.user_id);
    drive(&mut router, gateway, Some(session), RouterEvent::ProfileSetupCompleted).await;
    router.state()
}

/// Ask the gateway who the token belongs to. `None` means signed out.
///
/// A gateway outage keeps the stored session; the profile lookup that
/// follows reports the failure.
async fn confirm_user(gateway: &dyn Gateway, session: CurrentSession) -> Option<CurrentSession> {
    match gateway.current_user(&session.access_token).await {
        Ok(Some(user)) if user.id == session.user_id => Some(session),
        Ok(Some(user)) => {
            warn!(
                stored = %session.user_id,
                actual = %user.id,
                "Session token belongs to a different user"
            );
            None
        }
        Ok(None) => {
            debug!(user_id = %session.user_id, "Session token rejected");
            None
        }
        Err(e) => {
            warn!(error = %e, "Could not confirm session; keeping it");
            Some(session)
        }
    }
}

/// Feed `event` and run follow-up actions until the machine settles.
async fn drive(
    router: &mut RootRouter,
    gateway: &dyn Gateway,
    session: Option<&CurrentSession>,
    event: RouterEvent,
) {
    let mut action = router.handle(event);
    loop {
        match action {
            RouterAction::Idle => return,
            RouterAction::ReportError(message) => {
                warn!(error = %message, "Error fetching profile");
                return;
            }
            RouterAction::FetchProfile(user_id) => {
                let lookup = match session {
                    Some(session) => lookup_profile(gateway, session, user_id).await,
                    None => ProfileLookup::NotFound,
                };
                action = router.handle(RouterEvent::ProfileLoaded(lookup));
            }
        }
    }
}

async fn lookup_profile(
    gateway: &dyn Gateway,
    session: &CurrentSession,
    user_id: sparepart_nexus_core::UserId,
) -> ProfileLookup {
    match gateway.fetch_profile(&session.access_token, user_id).await {
        Ok(profile) => ProfileLookup::Found(profile),
        Err(GatewayError::NotFound) => ProfileLookup::NotFound,
        Err(e) => ProfileLookup::Failed(e.to_string()),
    }
}
