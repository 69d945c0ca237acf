// 🔐 Session context threaded into every core call
//
// The core does not authenticate anyone. The caller establishes the session
// and the core only asserts the flag at its boundary.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    /// Who is operating; informational only
    pub operator: String,
    pub authenticated: bool,
}

impl SessionContext {
    /// Session established by an auth gate
    pub fn authenticated(operator: impl Into<String>) -> Self {
        SessionContext {
            session_id: Uuid::new_v4(),
            operator: operator.into(),
            authenticated: true,
        }
    }

    /// Session that failed (or skipped) authentication
    pub fn anonymous() -> Self {
        SessionContext {
            session_id: Uuid::new_v4(),
            operator: String::new(),
            authenticated: false,
        }
    }

    pub fn ensure_authenticated(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            warn!(session = %self.session_id, "call refused: session not authenticated");
            Err(LedgerError::Unauthenticated)
        }
    }
}
