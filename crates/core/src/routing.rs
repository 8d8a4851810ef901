//! Root routing state machine.
//!
//! Decides which top-level view a visitor sees from two inputs: whether there
//! is a signed-in session, and what the profile lookup for that user returned.
//!
//! ```text
//! start ──► Loading ──(no session)──────────────► Unauthenticated
//!              │
//!              └──(session)──► fetch profile ──► NoProfile | Retailer
//!                                                | Manufacturer | UnknownRole
//! ```
//!
//! Any auth change re-enters from the top. Responses are applied in arrival
//! order with no generation check, so the last one wins. The machine performs
//! no I/O: it returns a [`RouterAction`] and the caller runs it and feeds the
//! result back as an event.

use crate::types::{Profile, ProfileKind, UserId};

/// The view to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteState {
    /// Waiting on the session or profile lookup.
    Loading,
    /// Nobody is signed in: show the auth form.
    Unauthenticated,
    /// Signed in without a profile row: show profile setup.
    NoProfile,
    /// Signed in as a retailer.
    Retailer { shop_name: String },
    /// Signed in as a manufacturer.
    Manufacturer { company_name: String },
    /// Signed in with a role this front end cannot serve.
    UnknownRole { role: String },
}

/// Outcome of fetching the signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileLookup {
    Found(Profile),
    /// No row for this user yet. Expected for new accounts.
    NotFound,
    /// Any other failure, with the gateway's message.
    Failed(String),
}

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterEvent {
    /// The initial "current session" query finished.
    SessionResolved(Option<UserId>),
    /// The gateway reported a sign-in, sign-out, or token change.
    AuthChanged(Option<UserId>),
    /// A profile fetch finished.
    ProfileLoaded(ProfileLookup),
    /// Profile setup wrote a row; look it up again.
    ProfileSetupCompleted,
}

/// Work the caller must do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    /// Nothing to do; the state is settled.
    Idle,
    /// Fetch this user's profile and report back with `ProfileLoaded`.
    FetchProfile(UserId),
    /// Log this failure. It is not shown to the user.
    ReportError(String),
}

/// Owns session and profile state for the top-level view.
#[derive(Debug, Clone)]
pub struct RootRouter {
    session: Option<UserId>,
    profile: Option<Profile>,
    loading: bool,
}

impl Default for RootRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RootRouter {
    /// A router that has not yet queried the session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            session: None,
            profile: None,
            loading: true,
        }
    }

    /// A router for `user_id` that is showing profile setup.
    #[must_use]
    pub const fn awaiting_profile(user_id: UserId) -> Self {
        Self {
            session: Some(user_id),
            profile: None,
            loading: false,
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn session(&self) -> Option<UserId> {
        self.session
    }

    /// The last profile applied.
    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Apply an event and return the follow-up work.
    pub fn handle(&mut self, event: RouterEvent) -> RouterAction {
        match event {
            RouterEvent::SessionResolved(session) | RouterEvent::AuthChanged(session) => {
                self.session = session;
                match session {
                    Some(user_id) => {
                        self.loading = true;
                        RouterAction::FetchProfile(user_id)
                    }
                    None => {
                        self.profile = None;
                        self.loading = false;
                        RouterAction::Idle
                    }
                }
            }
            RouterEvent::ProfileLoaded(lookup) => {
                self.loading = false;
                match lookup {
                    ProfileLookup::Found(profile) => {
                        self.profile = Some(profile);
                        RouterAction::Idle
                    }
                    ProfileLookup::NotFound => {
                        self.profile = None;
                        RouterAction::Idle
                    }
                    ProfileLookup::Failed(message) => {
                        self.profile = None;
                        RouterAction::ReportError(message)
                    }
                }
            }
            RouterEvent::ProfileSetupCompleted => match self.session {
                Some(user_id) => {
                    self.loading = true;
                    RouterAction::FetchProfile(user_id)
                }
                None => RouterAction::Idle,
            },
        }
    }

    /// The view for the current state.
    #[must_use]
    pub fn state(&self) -> RouteState {
        if self.loading {
            return RouteState::Loading;
        }
        if self.session.is_none() {
            return RouteState::Unauthenticated;
        }

        match self.profile.as_ref().map(|p| &p.kind) {
            None => RouteState::NoProfile,
            Some(ProfileKind::Retailer { shop_name }) => RouteState::Retailer {
                shop_name: shop_name.clone(),
            },
            Some(ProfileKind::Manufacturer { company_name }) => RouteState::Manufacturer {
                company_name: company_name.clone(),
            },
            Some(ProfileKind::Unrecognized { role }) => RouteState::UnknownRole { role: role.clone() },
        }
    }
}
