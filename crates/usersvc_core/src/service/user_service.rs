//! User use-case service.
//!
//! # Responsibility
//! - Create, read, selectively update and delete users.
//! - Turn "target missing" into absent results instead of errors.
//!
//! # Invariants
//! - `update_user` touches only fields supplied in the patch.
//! - `delete_user` reports whether a user existed right before the call and
//!   never asks the repository to delete an id it did not find.
//! - Repository errors pass through unchanged.

use crate::model::user::{User, UserId, UserPatch};
use crate::repo::user_repo::{RepoResult, UserRepository};
use log::info;

/// Service wrapper over a user repository.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Builds a new user and persists it.
    ///
    /// The returned value carries the store-assigned id.
    pub fn create_user(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        age: i32,
    ) -> RepoResult<User> {
        let mut user = User::new(name, email, age);
        self.repo.save(&mut user)?;
        info!(
            "event=user_create module=service status=ok id={}",
            user.id.unwrap_or_default()
        );
        Ok(user)
    }

    pub fn get_user_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo.find_by_id(id)
    }

    pub fn get_all_users(&self) -> RepoResult<Vec<User>> {
        self.repo.find_all()
    }

    /// Applies `patch` to the stored user with `id`.
    ///
    /// Returns `Ok(None)` without writing when no such user exists.
    pub fn update_user(&self, id: UserId, patch: UserPatch) -> RepoResult<Option<User>> {
        let fields = patch.supplied_fields();
        let Some(mut user) = self.repo.find_by_id(id)? else {
            info!("event=user_update module=service status=not_found id={id}");
            return Ok(None);
        };

        user.apply_patch(patch);
        self.repo.update(&user)?;
        info!("event=user_update module=service status=ok id={id} fields={fields}");
        Ok(Some(user))
    }

    /// Deletes the user with `id` when it exists.
    pub fn delete_user(&self, id: UserId) -> RepoResult<bool> {
        if self.repo.find_by_id(id)?.is_none() {
            info!("event=user_delete module=service status=not_found id={id}");
            return Ok(false);
        }

        self.repo.delete_by_id(id)?;
        info!("event=user_delete module=service status=ok id={id}");
        Ok(true)
    }
}
