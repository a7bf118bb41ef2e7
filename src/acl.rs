//! Parser for table ACL entries in the PostgreSQL `aclitem` text form
//! (`grantee=privileges/grantor`).
//!
//! Only a subset of the grammar is understood:
//!
//!   - an entry wrapped in double quotes (array element quoting) is unwrapped
//!     and `\"` / `\\` inside it are unescaped;
//!   - a double-quoted grantee is unquoted with `""` standing for one `"`;
//!   - an empty grantee is PUBLIC;
//!   - `*` grant-option markers are ignored;
//!   - any other privilege letter, or an unbalanced quote, makes the entry
//!     grant nothing.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ErrorCode, Result};

/// Privilege letters in canonical order.
pub const PRIVILEGES: &str = "arwdDxt";

lazy_static! {
    static ref ACL_ITEM: Regex =
        Regex::new(r#"^("(?:[^"]|"")+"|[^"=]*)=([arwdDxt*]*)(?:/(.*))?$"#).unwrap();
    static ref PERMISSION: Regex = Regex::new(r"^(?:.*=|)([arwdDxt]+)(?:/.*|)$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclItem {
    /// `None` for PUBLIC
    pub grantee: Option<String>,
    pub privileges: String,
    pub grantor: Option<String>,
}

fn unquote_identifier(identifier: &str) -> String {
    match identifier
        .strip_prefix('"')
        .and_then(|i| i.strip_suffix('"'))
    {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None => identifier.to_string(),
    }
}

pub fn parse_acl_item(item: &str) -> Option<AclItem> {
    let item = item.trim();
    let item = match item.strip_prefix('"').and_then(|i| i.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => item.to_string(),
    };

    let captures = ACL_ITEM.captures(&item)?;
    let grantee = unquote_identifier(captures.get(1).map_or("", |m| m.as_str()));
    let privileges = captures
        .get(2)
        .map_or("", |m| m.as_str())
        .chars()
        .filter(|c| *c != '*')
        .collect();
    let grantor = captures.get(3).map(|m| unquote_identifier(m.as_str()));

    Some(AclItem {
        grantee: (!grantee.is_empty()).then_some(grantee),
        privileges,
        grantor,
    })
}

/// Privileges `role` holds through `acl`, either granted to it directly or to
/// PUBLIC, in canonical order. Empty if none.
pub fn table_privileges(role: &str, acl: &[String]) -> String {
    let granted: String = acl
        .iter()
        .filter_map(|item| parse_acl_item(item))
        .filter(|item| item.grantee.as_deref().map_or(true, |g| g == role))
        .map(|item| item.privileges)
        .collect();

    PRIVILEGES.chars().filter(|c| granted.contains(*c)).collect()
}

/// Extracts the privilege letters from a permission string such as `r`,
/// `arw` or `alice=arw/bob`.
pub fn parse_permission(permission: &str) -> Result<String> {
    PERMISSION
        .captures(permission)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().chars().unique().collect())
        .ok_or(ErrorCode::InvalidParameter)
}

/// Whether every privilege letter in `permission` is contained in `privileges`.
pub fn has_privileges(privileges: &str, permission: &str) -> bool {
    permission.chars().all(|c| privileges.contains(c))
}
