//! Customer (tenant) context carried unchanged through every envelope.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Raw field values collected at the input node.
pub type UserInput = serde_json::Map<String, serde_json::Value>;

/// Subscription tier of the customer running the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    /// Free plan.
    #[default]
    Free,
    /// Entry paid plan.
    Starter,
    /// Professional plan.
    Professional,
    /// Enterprise plan.
    Enterprise,
    /// Any tier this engine version does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Starter => write!(f, "starter"),
            Self::Professional => write!(f, "professional"),
            Self::Enterprise => write!(f, "enterprise"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Identifies the tenant and user a run executes on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContext {
    /// Subscription tier.
    #[serde(default)]
    pub tier: CustomerTier,
    /// Industry the customer operates in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Granted permissions.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Tenant id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// User id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl CustomerContext {
    /// Creates a context for the given tier.
    #[must_use]
    pub fn new(tier: CustomerTier) -> Self {
        Self {
            tier,
            ..Default::default()
        }
    }

    /// Sets the industry.
    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Adds a permission.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Sets the tenant id.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Returns true if the permission has been granted.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Converts to a flat string map, used for structured renderings.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("tier".to_string(), self.tier.to_string());
        if let Some(ref v) = self.industry {
            map.insert("industry".to_string(), v.clone());
        }
        if let Some(ref v) = self.tenant_id {
            map.insert("tenant_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.user_id {
            map.insert("user_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.session_id {
            map.insert("session_id".to_string(), v.clone());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_context_builder() {
        let ctx = CustomerContext::new(CustomerTier::Professional)
            .with_industry("retail")
            .with_permission("publish")
            .with_user_id("u-1");

        assert_eq!(ctx.tier, CustomerTier::Professional);
        assert!(ctx.has_permission("publish"));
        assert!(!ctx.has_permission("admin"));
        assert_eq!(ctx.to_dict().get("industry"), Some(&"retail".to_string()));
    }

    #[test]
    fn test_unknown_tier_deserializes() {
        let ctx: CustomerContext =
            serde_json::from_str(r#"{"tier": "platinum", "userId": "u-9"}"#).unwrap();
        assert_eq!(ctx.tier, CustomerTier::Unknown);
        assert_eq!(ctx.user_id.as_deref(), Some("u-9"));
    }
}
