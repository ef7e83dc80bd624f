//! Role-based access control for authenticated gateway sessions.
//!
//! Every operation a paired client requests is checked against the
//! session's role before it reaches the gateway's functional layer.  The
//! policy is deliberately static: a fixed three-tier hierarchy and fixed
//! tool allow-sets, with no mutable state, so it is safe to call from any
//! number of concurrent request handlers without synchronization.
//!
//! "Forbidden" is expressed as absence — [`filter_tools_by_role`] omits
//! disallowed tools rather than returning an error — which keeps the
//! contract total and side-effect-free.

use serde::{Deserialize, Serialize};

/// The role hierarchy, totally ordered by rank.
///
/// Raw role strings enter the system only through [`resolve_user_role`];
/// everywhere else the closed enum guarantees an unknown role cannot
/// exist, let alone gain permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer = 1,
    Editor = 2,
    Admin = 3,
}

impl Role {
    /// Numeric rank: `viewer=1 < editor=2 < admin=3`.
    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// An authenticated session, created on pairing approval.
///
/// The auth-token layer owns the session lifecycle; this core only reads
/// `role` when authorizing operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Which requester/account this session belongs to.
    pub identity: String,
    pub role: Role,
}

/// Tool names starting with this prefix are always safe to expose.
pub const READ_TOOL_PREFIX: &str = "read_";
/// Tool names starting with this prefix are always safe to expose.
pub const VIEW_TOOL_PREFIX: &str = "view_";

/// Read-only tools available to every role.
pub const VIEW_ONLY_TOOLS: &[&str] = &[
    "read",
    "ls",
    "search",
    "grep_search",
    "find_by_name",
    "list_dir",
    "cat",
    "view_file",
    "view_code_item",
    "view_file_outline",
];

/// Tools available to `editor` and above: the viewer set plus the
/// write/edit set.  Any adapter layer exposing operations must keep these
/// constants in sync with the tools it registers.
pub const EDITOR_TOOLS: &[&str] = &[
    "read",
    "ls",
    "search",
    "grep_search",
    "find_by_name",
    "list_dir",
    "cat",
    "view_file",
    "view_code_item",
    "view_file_outline",
    "write",
    "edit",
    "replace_file_content",
    "write_to_file",
    "multi_replace_file_content",
    "apply_patch",
];

/// Returns `true` iff `user`'s rank meets or exceeds `required`'s rank.
pub fn has_permission(user: Role, required: Role) -> bool {
    user.rank() >= required.rank()
}

/// Parses a raw role string at the trust boundary.
///
/// Trims and lowercases, then matches exactly `admin`, `editor`, or
/// `viewer`; anything else falls back to `default`.  Callers without a
/// site-specific policy pass `Role::Viewer`.
pub fn resolve_user_role(raw: Option<&str>, default: Role) -> Role {
    match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
        Some("admin") => Role::Admin,
        Some("editor") => Role::Editor,
        Some("viewer") => Role::Viewer,
        _ => default,
    }
}

/// Anything with a flat tool-name string.  Implemented for plain strings
/// so adapters can filter either bare names or richer tool descriptors.
pub trait ToolName {
    fn tool_name(&self) -> &str;
}

impl ToolName for String {
    fn tool_name(&self) -> &str {
        self
    }
}

impl ToolName for &str {
    fn tool_name(&self) -> &str {
        self
    }
}

/// Filters a tool list down to what `role` may invoke.
///
/// `admin` passes everything unfiltered.  Other roles retain a tool when
/// its name is in the role's allow-set, or when it starts with the
/// `read_`/`view_` prefixes (always considered safe).  The filter is pure
/// and order-preserving.
pub fn filter_tools_by_role<T: ToolName>(tools: Vec<T>, role: Role) -> Vec<T> {
    if role == Role::Admin {
        return tools;
    }

    let allowed: &[&str] = match role {
        Role::Editor => EDITOR_TOOLS,
        _ => VIEW_ONLY_TOOLS,
    };

    tools
        .into_iter()
        .filter(|tool| {
            let name = tool.tool_name();
            allowed.contains(&name)
                || name.starts_with(READ_TOOL_PREFIX)
                || name.starts_with(VIEW_TOOL_PREFIX)
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tools() -> Vec<&'static str> {
        vec![
            "read",
            "write",
            "apply_patch",
            "deploy",
            "read_calendar",
            "view_canvas",
            "search",
        ]
    }

    // ── has_permission ────────────────────────────────────────────────────────

    #[test]
    fn test_has_permission_allows_equal_rank() {
        assert!(has_permission(Role::Viewer, Role::Viewer));
        assert!(has_permission(Role::Editor, Role::Editor));
        assert!(has_permission(Role::Admin, Role::Admin));
    }

    #[test]
    fn test_has_permission_allows_higher_rank() {
        assert!(has_permission(Role::Admin, Role::Viewer));
        assert!(has_permission(Role::Editor, Role::Viewer));
    }

    #[test]
    fn test_has_permission_denies_lower_rank() {
        assert!(!has_permission(Role::Viewer, Role::Editor));
        assert!(!has_permission(Role::Editor, Role::Admin));
    }

    #[test]
    fn test_role_ordering_matches_rank() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::Admin);
    }

    // ── resolve_user_role ─────────────────────────────────────────────────────

    #[test]
    fn test_resolve_user_role_trims_and_lowercases() {
        assert_eq!(resolve_user_role(Some("  Admin "), Role::Viewer), Role::Admin);
        assert_eq!(resolve_user_role(Some("EDITOR"), Role::Viewer), Role::Editor);
    }

    #[test]
    fn test_resolve_user_role_falls_back_to_default_for_unknown() {
        assert_eq!(resolve_user_role(Some("owner"), Role::Viewer), Role::Viewer);
        assert_eq!(resolve_user_role(Some(""), Role::Editor), Role::Editor);
        assert_eq!(resolve_user_role(None, Role::Viewer), Role::Viewer);
    }

    // ── filter_tools_by_role ──────────────────────────────────────────────────

    #[test]
    fn test_admin_passes_all_tools_unfiltered_in_order() {
        let tools = all_tools();
        let filtered = filter_tools_by_role(tools.clone(), Role::Admin);
        assert_eq!(filtered, tools);
    }

    #[test]
    fn test_viewer_gets_read_only_subset() {
        let filtered = filter_tools_by_role(all_tools(), Role::Viewer);
        assert_eq!(
            filtered,
            vec!["read", "read_calendar", "view_canvas", "search"]
        );
    }

    #[test]
    fn test_editor_gets_viewer_set_plus_write_tools() {
        let filtered = filter_tools_by_role(all_tools(), Role::Editor);
        assert_eq!(
            filtered,
            vec!["read", "write", "apply_patch", "read_calendar", "view_canvas", "search"]
        );
    }

    #[test]
    fn test_prefixed_tools_pass_for_every_role() {
        let tools = vec!["read_anything_at_all", "view_whatever"];
        for role in [Role::Viewer, Role::Editor, Role::Admin] {
            assert_eq!(filter_tools_by_role(tools.clone(), role).len(), 2);
        }
    }

    #[test]
    fn test_filter_is_monotone_in_role_rank() {
        // For r1 <= r2, the r1 result must be a subset of the r2 result.
        let tools = all_tools();
        let by_role = [
            filter_tools_by_role(tools.clone(), Role::Viewer),
            filter_tools_by_role(tools.clone(), Role::Editor),
            filter_tools_by_role(tools.clone(), Role::Admin),
        ];

        for window in by_role.windows(2) {
            for tool in &window[0] {
                assert!(
                    window[1].contains(tool),
                    "{tool} allowed at lower rank but not higher"
                );
            }
        }
    }

    #[test]
    fn test_editor_set_contains_entire_viewer_set() {
        for tool in VIEW_ONLY_TOOLS {
            assert!(EDITOR_TOOLS.contains(tool), "{tool} missing from editor set");
        }
    }

    #[test]
    fn test_filter_works_on_owned_strings() {
        let tools: Vec<String> = vec!["read".to_string(), "deploy".to_string()];
        let filtered = filter_tools_by_role(tools, Role::Viewer);
        assert_eq!(filtered, vec!["read".to_string()]);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(role, Role::Viewer);
    }
}
