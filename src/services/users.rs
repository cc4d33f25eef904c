//! User profile reads and writes.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{collection, ServiceContext};
use crate::cache::keys::scoped;
use crate::cache::policy::category;
use crate::cache::{CacheEvent, Namespace};
use crate::document::{decode_all, to_body, Direction, DocumentStore, Query, StoreError};
use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserUpdate};

#[derive(Clone)]
pub struct UserService {
    context: ServiceContext,
}

impl UserService {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    /// All users, newest first.
    pub async fn list(&self) -> Result<Arc<Vec<User>>> {
        self.context
            .cached(Namespace::Users, category::ALL, category::ALL, |store| async move {
                let query = Query::new().order_by("created_at", Direction::Descending);
                let documents = store.query(collection::USERS, &query).await?;
                decode_all::<User>(&documents)
            })
            .await
    }

    pub async fn by_id(&self, id: &str) -> Result<Arc<Option<User>>> {
        let owned = id.to_string();
        self.context
            .cached(
                Namespace::Users,
                category::ID,
                &scoped(category::ID, id),
                move |store| async move {
                    store
                        .get(collection::USERS, &owned)
                        .await?
                        .map(|doc| doc.decode::<User>())
                        .transpose()
                },
            )
            .await
    }

    pub async fn by_username(&self, username: &str) -> Result<Arc<Option<User>>> {
        let owned = username.to_string();
        self.context
            .cached(
                Namespace::Users,
                category::USERNAME,
                &scoped(category::USERNAME, username),
                move |store| async move { find_by_username(store.as_ref(), &owned).await },
            )
            .await
    }

    /// Registers a user. Usernames are unique.
    pub async fn create(&self, request: NewUser) -> Result<User> {
        if let Some(message) = request.validate() {
            return Err(AppError::InvalidRequest(message));
        }
        let store = self.context.store();
        if find_by_username(store, &request.username).await?.is_some() {
            return Err(AppError::InvalidRequest(format!(
                "Username '{}' is taken",
                request.username
            )));
        }

        let user = User {
            id: String::new(),
            username: request.username,
            display_name: request.display_name,
            email: request.email,
            bio: request.bio,
            avatar_url: None,
            created_at: Utc::now(),
        };
        let document = store.create(collection::USERS, to_body(&user)?).await?;
        let user: User = document.decode()?;

        self.invalidate(&user, CacheEvent::UserCreated);
        info!(id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn update(&self, id: &str, update: UserUpdate) -> Result<User> {
        let document = self
            .context
            .store()
            .update(collection::USERS, id, to_body(&update)?)
            .await?;
        let user: User = document.decode()?;

        self.invalidate(&user, CacheEvent::UserUpdated);
        info!(id = %user.id, "User updated");
        Ok(user)
    }

    fn invalidate(&self, user: &User, event: CacheEvent) {
        let invalidator = self.context.invalidator();
        invalidator.user_changed(&user.id, Some(&user.username));
        invalidator.invalidate_by_event(event);
    }
}

async fn find_by_username(
    store: &dyn DocumentStore,
    username: &str,
) -> std::result::Result<Option<User>, StoreError> {
    let query = Query::new().eq("username", username).limit(1);
    let documents = store.query(collection::USERS, &query).await?;
    documents.first().map(|doc| doc.decode::<User>()).transpose()
}
