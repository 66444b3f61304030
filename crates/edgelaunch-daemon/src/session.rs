//! Session bookkeeping for socket clients.

use edgelaunch_rpc::ClientRole;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct HostSession {
    pub id: SessionId,
    pub name: String,
}

/// A connection is `Pending` until it sends `register`.
#[derive(Debug, Clone)]
pub enum Session {
    Pending(SessionId),
    Control(SessionId),
    Host(HostSession),
}

impl Session {
    #[must_use]
    pub fn registered(id: SessionId, role: ClientRole) -> Self {
        match role {
            ClientRole::Control => Session::Control(id),
            ClientRole::Host { name } => Session::Host(HostSession { id, name }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        match self {
            Session::Pending(id) | Session::Control(id) => id,
            Session::Host(s) => &s.id,
        }
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        !matches!(self, Session::Pending(_))
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        matches!(self, Session::Host(_))
    }

    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        match self {
            Session::Host(s) => Some(&s.name),
            _ => None,
        }
    }
}
