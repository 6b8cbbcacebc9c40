//! Permission strings and the authorization decision
//!
//! Grants and requirements share one wire form, `<resource>:<action>:<scope>`.
//! Parsing never fails: missing trailing segments become empty fields and any
//! segment after the third is dropped.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::scope::{scope_match, Scope};

/// Segment separator in the permission wire format
pub const PERMISSION_SEPARATOR: char = ':';

/// A parsed `<resource>:<action>:<scope>` triple
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Permission {
    pub resource: String,
    pub action: String,
    pub scope: String,
}

impl Permission {
    pub fn new(
        resource: impl Into<String>,
        action: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            scope: scope.into(),
        }
    }

    /// Build a requirement at a known scope.
    pub fn scoped(resource: impl Into<String>, action: impl Into<String>, scope: Scope) -> Self {
        Self::new(resource, action, scope.as_str())
    }

    /// Parse a permission string, filling fields left to right.
    ///
    /// `"doc:read:global:extra"` parses the same as `"doc:read:global"`, so
    /// formatting a parsed value does not always reproduce the input.
    pub fn parse(s: &str) -> Self {
        let mut segments = s.split(PERMISSION_SEPARATOR);
        let mut next = || segments.next().unwrap_or_default().to_string();

        let resource = next();
        let action = next();
        let scope = next();

        Self {
            resource,
            action,
            scope,
        }
    }

    /// The scope as a known variant, if it is one.
    pub fn known_scope(&self) -> Option<Scope> {
        self.scope.parse().ok()
    }

    /// True if this grant satisfies `required`.
    pub fn grants(&self, required: &Permission) -> bool {
        self.resource == required.resource
            && self.action == required.action
            && scope_match(&self.scope, &required.scope)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.resource,
            self.action,
            self.scope,
            sep = PERMISSION_SEPARATOR
        )
    }
}

impl FromStr for Permission {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Permission {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Permission {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Permission> for String {
    fn from(p: Permission) -> Self {
        p.to_string()
    }
}

/// Returns true if any entry of `user_perms` satisfies `required`.
///
/// Entries are trimmed and parsed in order; resource and action must match
/// exactly and the granted scope must dominate the required one. Stops at the
/// first match.
pub fn has_permission<I, S>(user_perms: I, required: &Permission) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    user_perms
        .into_iter()
        .any(|raw| Permission::parse(raw.as_ref().trim()).grants(required))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fills_fields_left_to_right() {
        assert_eq!(Permission::parse(""), Permission::new("", "", ""));
        assert_eq!(Permission::parse("doc"), Permission::new("doc", "", ""));
        assert_eq!(Permission::parse("doc:read"), Permission::new("doc", "read", ""));
        assert_eq!(
            Permission::parse("doc:read:global"),
            Permission::new("doc", "read", "global")
        );
    }

    #[test]
    fn test_parse_drops_extra_segments() {
        let p = Permission::parse("doc:read:global:extra");
        assert_eq!(p, Permission::new("doc", "read", "global"));
        assert_eq!(p.to_string(), "doc:read:global");
    }

    #[test]
    fn test_parse_keeps_empty_middle_segments() {
        assert_eq!(Permission::parse("doc::tenant"), Permission::new("doc", "", "tenant"));
        assert_eq!(Permission::parse(":::"), Permission::default());
    }

    #[test]
    fn test_parse_does_not_trim() {
        let p = Permission::parse(" doc:read:global ");
        assert_eq!(p.resource, " doc");
        assert_eq!(p.scope, "global ");
    }

    #[test]
    fn test_display_round_trips_partial_strings() {
        let p = Permission::parse("doc:read");
        assert_eq!(p.to_string(), "doc:read:");
        assert_eq!(Permission::parse(&p.to_string()), p);
    }

    #[test]
    fn test_known_scope() {
        assert_eq!(Permission::parse("doc:read:tenant").known_scope(), Some(Scope::Tenant));
        assert_eq!(Permission::parse("doc:read:org").known_scope(), None);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let p = Permission::new("user", "update", "self");
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"user:update:self\"");
        let back: Permission = serde_json::from_str("\"user:update\"").unwrap();
        assert_eq!(back, Permission::new("user", "update", ""));
    }

    #[test]
    fn test_empty_grant_list_never_matches() {
        let required = Permission::new("doc", "read", "");
        assert!(!has_permission(Vec::<String>::new(), &required));
        assert!(!has_permission(&[] as &[&str], &required));
    }

    #[test]
    fn test_global_grant_satisfies_tenant_requirement() {
        let required = Permission::scoped("doc", "read", Scope::Tenant);
        assert!(has_permission(["doc:read:global"], &required));
    }

    #[test]
    fn test_self_grant_does_not_satisfy_global_requirement() {
        let required = Permission::scoped("doc", "read", Scope::Global);
        assert!(!has_permission(["doc:read:self"], &required));
    }

    #[test]
    fn test_resource_and_action_must_match_exactly() {
        let required = Permission::scoped("doc", "read", Scope::Global);
        assert!(!has_permission(["user:read:global"], &required));
        assert!(!has_permission(["doc:write:global"], &required));
        assert!(!has_permission(["Doc:read:global"], &required));
        assert!(!has_permission(["doc:READ:global"], &required));
    }

    #[test]
    fn test_entries_are_trimmed_before_parsing() {
        let required = Permission::scoped("doc", "read", Scope::Tenant);
        assert!(has_permission(["  doc:read:tenant\t"], &required));
    }

    #[test]
    fn test_any_matching_entry_is_enough() {
        let required = Permission::scoped("user", "update", Scope::Own);
        let grants = vec![
            "doc:read:global".to_string(),
            "user:update:self".to_string(),
            "user:delete:tenant".to_string(),
        ];
        assert!(has_permission(&grants, &required));
    }

    #[test]
    fn test_unknown_scope_asymmetry_is_preserved() {
        // Unknown required scope: met by any grant for the same resource/action.
        let unknown_required = Permission::new("doc", "read", "org");
        assert!(has_permission(["doc:read:self"], &unknown_required));
        assert!(has_permission(["doc:read"], &unknown_required));

        // Unknown granted scope: meets no known requirement.
        let self_required = Permission::scoped("doc", "read", Scope::Own);
        assert!(!has_permission(["doc:read:org"], &self_required));
        assert!(!has_permission(["doc:read"], &self_required));
    }

    #[test]
    fn test_grants_checks_all_three_fields() {
        let grant = Permission::parse("user:read:department");
        assert!(grant.grants(&Permission::scoped("user", "read", Scope::Own)));
        assert!(grant.grants(&Permission::scoped("user", "read", Scope::Department)));
        assert!(!grant.grants(&Permission::scoped("user", "read", Scope::Tenant)));
    }
}
