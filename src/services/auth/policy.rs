//! Authorization policies.
//!
//! A policy is evaluated after authentication against the request's
//! `AuthCtx`. No context means the caller is challenged (401); a context that
//! does not satisfy the requirement is forbidden (403).

use crate::api::extractors::AuthCtx;

pub const REQUIRE_ADMINISTRATOR_ROLE: &str = "RequireAdministratorRole";
pub const ADMIN_ROLE: &str = "Admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Role(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Challenge,
    Forbid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub name: &'static str,
    pub requirement: Requirement,
}

impl Policy {
    pub fn authenticated() -> Self {
        Self {
            name: "Authenticated",
            requirement: Requirement::Authenticated,
        }
    }

    pub fn require_administrator_role() -> Self {
        Self {
            name: REQUIRE_ADMINISTRATOR_ROLE,
            requirement: Requirement::Role(ADMIN_ROLE),
        }
    }

    pub fn evaluate(&self, ctx: Option<&AuthCtx>) -> Decision {
        let Some(ctx) = ctx else {
            return Decision::Challenge;
        };
        match &self.requirement {
            Requirement::Authenticated => Decision::Allow,
            Requirement::Role(role) if ctx.is_in_role(role) => Decision::Allow,
            Requirement::Role(_) => Decision::Forbid,
        }
    }
}
