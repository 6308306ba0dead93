use cashdrop_shared::Masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{CoreError, CoreResult};

/// Caller context attached by the authentication layer (OTP/MPIN happen elsewhere)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub token: Masked<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            token: Masked(token.into()),
            expires_at,
        }
    }
}

/// Decides whether the caller may place orders at all
pub trait SessionGate: Send + Sync {
    fn authorize(&self, session: &SessionContext) -> CoreResult<()>;
}

/// Accepts any session with a token that has not expired
pub struct ActiveSessionGate;

impl SessionGate for ActiveSessionGate {
    fn authorize(&self, session: &SessionContext) -> CoreResult<()> {
        if session.user_id.trim().is_empty() || session.token.expose().is_empty() {
            warn!("Rejected session without credentials");
            return Err(CoreError::SessionError("missing session credentials".to_string()));
        }
        if session.expires_at <= Utc::now() {
            warn!("Rejected expired session for {}", session.user_id);
            return Err(CoreError::SessionError(format!(
                "session for {} expired at {}",
                session.user_id, session.expires_at
            )));
        }
        Ok(())
    }
}
