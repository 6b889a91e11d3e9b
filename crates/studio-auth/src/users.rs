//! User directory implementations.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use studio_core::{AdminUser, LoginInfo, Me, Page, Role, User};

use crate::ports::{StoreError, UserRepository};

/// Newest first; ties broken by id so pages are stable.
fn sort_newest_first(users: &mut [User]) {
    users.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn page_of<'a>(users: &'a [User], page: Page) -> impl Iterator<Item = &'a User> {
    users.iter().skip(page.offset).take(page.limit)
}

#[derive(Debug, Default)]
struct Directory {
    users: HashMap<String, User>,
    login_info: HashMap<String, LoginInfo>,
}

impl Directory {
    fn entry(&mut self, user_id: &str) -> &mut User {
        self.users
            .entry(user_id.to_string())
            .or_insert_with(|| User::new(user_id))
    }
}

/// In-memory user directory.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    inner: RwLock<Directory>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count users.
    pub async fn count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl UserRepository for MemoryUserDirectory {
    async fn ensure_exists(&self, user_id: &str) -> Result<(), StoreError> {
        self.inner.write().await.entry(user_id);
        Ok(())
    }

    async fn save_login_info(&self, info: &LoginInfo) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .login_info
            .insert(info.user_id.clone(), info.clone());
        Ok(())
    }

    async fn get_role(&self, user_id: &str) -> Result<Role, StoreError> {
        self.inner
            .read()
            .await
            .users
            .get(user_id)
            .map(|u| u.role)
            .ok_or(StoreError::NotFound)
    }

    async fn set_role(&self, user_id: &str, role: Role) -> Result<(), StoreError> {
        let mut dir = self.inner.write().await;
        let user = dir.entry(user_id);
        user.role = role;
        user.touch();
        Ok(())
    }

    async fn list_users(&self, page: Page) -> Result<Vec<AdminUser>, StoreError> {
        let dir = self.inner.read().await;
        let mut users: Vec<User> = dir.users.values().cloned().collect();
        sort_newest_first(&mut users);

        Ok(page_of(&users, page)
            .map(|u| AdminUser::compose(u, dir.login_info.get(&u.id)))
            .collect())
    }

    async fn get_me(&self, user_id: &str) -> Result<Me, StoreError> {
        let dir = self.inner.read().await;
        let user = dir.users.get(user_id).ok_or(StoreError::NotFound)?;
        Ok(Me::compose(user, dir.login_info.get(user_id)))
    }

    async fn set_nickname(&self, user_id: &str, nickname: &str) -> Result<(), StoreError> {
        let mut dir = self.inner.write().await;
        let user = dir.entry(user_id);
        user.nickname = nickname.to_string();
        user.touch();
        Ok(())
    }
}

/// User directory backed by sled.
///
/// Users and login-info snapshots live in separate trees, both keyed by
/// the identity-provider uid.
pub struct SledUserDirectory {
    db: sled::Db,
    users: sled::Tree,
    login_info: sled::Tree,
}

impl SledUserDirectory {
    /// Open or create a user directory at the given path.
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path.join("users"))?;
        Self::with_db(db)
    }

    /// Create a user directory with an existing sled database.
    ///
    /// # Errors
    ///
    /// Returns error if trees cannot be opened.
    pub fn with_db(db: sled::Db) -> Result<Self, StoreError> {
        let users = db.open_tree("users")?;
        let login_info = db.open_tree("login_info")?;
        Ok(Self {
            db,
            users,
            login_info,
        })
    }

    /// Get the underlying sled database.
    #[must_use]
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Count users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.users.len()
    }

    /// Get a user record by id.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        match self.users.get(user_id.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Get the login-info snapshot for a user.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn login_info(&self, user_id: &str) -> Result<Option<LoginInfo>, StoreError> {
        match self.login_info.get(user_id.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Load or create the user, apply `f`, and write it back.
    ///
    /// The write swaps against the record that was read; a concurrent
    /// change to the same user makes it retry.
    async fn modify<F>(&self, user_id: &str, f: F) -> Result<(), StoreError>
    where
        F: Fn(&mut User) + Send,
    {
        loop {
            let current = self.users.get(user_id.as_bytes())?;
            let mut user = match &current {
                Some(value) => serde_json::from_slice(value)?,
                None => User::new(user_id),
            };
            f(&mut user);
            user.touch();
            let value = serde_json::to_vec(&user)?;

            if self
                .users
                .compare_and_swap(user_id.as_bytes(), current, Some(value))?
                .is_ok()
            {
                break;
            }
            tracing::trace!(user_id, "User record changed concurrently, retrying");
        }

        self.users.flush_async().await?;
        Ok(())
    }

    fn all_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users = Vec::new();
        for result in self.users.iter() {
            let (_, value) = result?;
            users.push(serde_json::from_slice(&value)?);
        }
        Ok(users)
    }
}

impl std::fmt::Debug for SledUserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledUserDirectory")
            .field("user_count", &self.count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UserRepository for SledUserDirectory {
    async fn ensure_exists(&self, user_id: &str) -> Result<(), StoreError> {
        let value = serde_json::to_vec(&User::new(user_id))?;

        // Insert only if absent; an existing record is left untouched.
        let created = self
            .users
            .compare_and_swap(user_id.as_bytes(), None as Option<&[u8]>, Some(value))?
            .is_ok();

        if created {
            tracing::debug!(user_id, "Created user record");
            self.users.flush_async().await?;
        }
        Ok(())
    }

    async fn save_login_info(&self, info: &LoginInfo) -> Result<(), StoreError> {
        let value = serde_json::to_vec(info)?;
        self.login_info.insert(info.user_id.as_bytes(), value)?;
        self.login_info.flush_async().await?;
        Ok(())
    }

    async fn get_role(&self, user_id: &str) -> Result<Role, StoreError> {
        self.get(user_id)?
            .map(|u| u.role)
            .ok_or(StoreError::NotFound)
    }

    async fn set_role(&self, user_id: &str, role: Role) -> Result<(), StoreError> {
        self.modify(user_id, |u| u.role = role).await
    }

    async fn list_users(&self, page: Page) -> Result<Vec<AdminUser>, StoreError> {
        let mut users = self.all_users()?;
        sort_newest_first(&mut users);

        page_of(&users, page)
            .map(|u| Ok(AdminUser::compose(u, self.login_info(&u.id)?.as_ref())))
            .collect()
    }

    async fn get_me(&self, user_id: &str) -> Result<Me, StoreError> {
        let user = self.get(user_id)?.ok_or(StoreError::NotFound)?;
        let info = self.login_info(user_id)?;
        Ok(Me::compose(&user, info.as_ref()))
    }

    async fn set_nickname(&self, user_id: &str, nickname: &str) -> Result<(), StoreError> {
        self.modify(user_id, |u| u.nickname = nickname.to_string())
            .await
    }
}
