use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// The person an operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
    pub email: String,
}

/// Resolves the current actor. The service never looks at ambient global
/// state for identity; whoever builds the app decides where actors come
/// from.
pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> Option<Actor>;
}

/// Fixed actor from configuration. Used as the development fallback when no
/// auth layer sits in front of the service, and as a test double.
pub struct StaticIdentity {
    actor: Option<Actor>,
}

impl StaticIdentity {
    pub fn new(actor: Option<Actor>) -> Self {
        Self { actor }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Option<Actor> {
        self.actor.clone()
    }
}

/// Actor identity set per request by the fronting auth layer.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let id = header_value(headers, "x-user-id")?;
    Some(Actor {
        id,
        display_name: header_value(headers, "x-user-name").unwrap_or_default(),
        email: header_value(headers, "x-user-email").unwrap_or_default(),
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}
