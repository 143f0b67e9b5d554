//! Row actions addressed by a stable key.
//!
//! A [`Command`] names an entity and an action on it, e.g.
//! `appointment:cancel:7`. [`dispatch`] resolves it through a fixed
//! (kind, action) route table and runs it against the store or the form
//! session. A command is only run when the current view offers it, so a
//! completed appointment cannot be cancelled through a stale key.

use std::fmt;
use std::str::FromStr;

use crate::error::{DispatchError, Error};
use crate::form::FormSession;
use crate::model::{AppointmentStatus, EntityKind};
use crate::store::{EntityStore, Outcome};
use crate::view;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Edit,
    Delete,
    ToggleActive,
    Complete,
    Cancel,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ToggleActive => "toggle",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        match value {
            "edit" => Some(Self::Edit),
            "delete" => Some(Self::Delete),
            "toggle" => Some(Self::ToggleActive),
            "complete" => Some(Self::Complete),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    pub kind: EntityKind,
    pub action: Action,
    pub id: i64,
}

impl Command {
    pub fn new(kind: EntityKind, action: Action, id: i64) -> Self {
        Self { kind, action, id }
    }

    /// `kind:action:id`
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.kind, self.action, self.id)
    }

    pub fn parse(key: &str) -> Result<Self, DispatchError> {
        let malformed = || DispatchError::MalformedKey(key.to_string());
        let mut parts = key.trim().split(':');
        let (Some(kind), Some(action), Some(id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        Ok(Self {
            kind: EntityKind::from_key(kind).ok_or_else(malformed)?,
            action: Action::from_key(action).ok_or_else(malformed)?,
            id: id.parse().map_err(|_| malformed())?,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Command {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Handler a (kind, action) pair resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    OpenForm,
    Delete,
    ToggleActive,
    SetStatus(AppointmentStatus),
}

const ROUTES: &[(EntityKind, Action, Route)] = &[
    (EntityKind::Client, Action::Edit, Route::OpenForm),
    (EntityKind::Client, Action::Delete, Route::Delete),
    (EntityKind::Service, Action::Edit, Route::OpenForm),
    (EntityKind::Service, Action::ToggleActive, Route::ToggleActive),
    (EntityKind::Service, Action::Delete, Route::Delete),
    (EntityKind::Appointment, Action::Edit, Route::OpenForm),
    (
        EntityKind::Appointment,
        Action::Complete,
        Route::SetStatus(AppointmentStatus::Completed),
    ),
    (
        EntityKind::Appointment,
        Action::Cancel,
        Route::SetStatus(AppointmentStatus::Cancelled),
    ),
    (EntityKind::Appointment, Action::Delete, Route::Delete),
];

pub fn route(kind: EntityKind, action: Action) -> Result<Route, DispatchError> {
    ROUTES
        .iter()
        .find(|(k, a, _)| *k == kind && *a == action)
        .map(|(_, _, route)| *route)
        .ok_or(DispatchError::Unsupported {
            kind,
            action: action.as_str(),
        })
}

/// What a dispatched command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    FormOpened,
    Mutation(Outcome),
}

pub async fn dispatch(
    store: &EntityStore,
    session: &mut FormSession,
    command: Command,
) -> Result<Dispatched, Error> {
    let route = route(command.kind, command.action)?;
    let offered = view::actions_for(store, command.kind, command.id)
        .is_some_and(|actions| actions.contains(&command));
    if !offered {
        return Err(DispatchError::NotOffered(command.key()).into());
    }

    tracing::debug!(command = %command, ?route, "Dispatching command");
    let id = command.id;
    let outcome = match (route, command.kind) {
        (Route::OpenForm, kind) => {
            session.open(kind, Some(id), store)?;
            return Ok(Dispatched::FormOpened);
        }
        (Route::Delete, EntityKind::Client) => store.delete_client(id).await?,
        (Route::Delete, EntityKind::Service) => store.delete_service(id).await?,
        (Route::Delete, EntityKind::Appointment) => store.delete_appointment(id).await?,
        (Route::ToggleActive, _) => {
            store.toggle_service_active(id).await?;
            Outcome::Applied
        }
        (Route::SetStatus(status), _) => store.set_appointment_status(id, status).await?,
    };
    Ok(Dispatched::Mutation(outcome))
}
