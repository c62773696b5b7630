//! User entity and partial-update request.
//!
//! # Invariants
//! - `id == None` means the value was never persisted.
//! - `id == Some(_)` maps to exactly one `users` row until that row is deleted;
//!   after deletion the in-memory value is stale but keeps its id.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned surrogate key (`users.id`).
pub type UserId = i64;

/// In-memory representation of one `users` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store on first save, immutable afterwards.
    pub id: Option<UserId>,
    pub name: String,
    /// Not unique.
    pub email: String,
    pub age: i32,
}

impl User {
    /// Creates a transient user (no id yet).
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Applies every supplied field of `patch`, leaving the others untouched.
    pub fn apply_patch(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "User{{id={id}")?,
            None => write!(f, "User{{id=null")?,
        }
        write!(
            f,
            ", name='{}', email='{}', age={}}}",
            self.name, self.email, self.age
        )
    }
}

/// Selective update request.
///
/// `None` means "keep the current value". `Some(String::new())` is a real
/// value and clears the field; mapping blank console input to `None` is the
/// caller's decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
}

impl UserPatch {
    /// Returns whether no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none()
    }

    /// Comma-separated names of supplied fields, for metadata-only logging.
    pub(crate) fn supplied_fields(&self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        if self.age.is_some() {
            fields.push("age");
        }
        fields.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::UserPatch;

    #[test]
    fn supplied_fields_lists_present_fields_or_none() {
        assert_eq!(UserPatch::default().supplied_fields(), "none");

        let patch = UserPatch {
            name: Some(String::new()),
            age: Some(3),
            ..UserPatch::default()
        };
        assert_eq!(patch.supplied_fields(), "name,age");
    }
}
