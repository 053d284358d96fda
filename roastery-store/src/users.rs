//! CRUD accessors for the `users` collection.
//!
//! Every mutating accessor is a single critical section: the lock is
//! acquired once and the read, mutation and write all happen under it.
//! Concurrent `create_user` calls therefore always observe each other's
//! appends and assign distinct ids.

use crate::document::DocumentStore;
use crate::error::{StoreError, StoreResult};
use chrono::Utc;
use roastery_types::UserId;
use serde_json::{Map, Value, json};
use tracing::info;

impl DocumentStore {
    /// Finds the first user whose `email` field equals the argument
    /// exactly. Fails only on store-level read failure.
    pub async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Value>> {
        let document = self.read().await?;
        Ok(document.find_user_by_email(email).cloned())
    }

    /// Finds the user with the given id, matching a JSON number or a
    /// numeric string.
    pub async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<Value>> {
        let document = self.read().await?;
        Ok(document
            .find_user_index(id)
            .map(|index| document.users[index].clone()))
    }

    /// Creates a user from the caller-supplied fields and returns the
    /// stored record.
    ///
    /// The assigned `id` (one more than the largest existing id) and the
    /// `created_at` / `updated_at` stamps override any same-named fields in
    /// `data`. A non-object payload is rejected with
    /// [`StoreError::InvalidDocument`].
    pub async fn create_user(&self, data: Value) -> StoreResult<Value> {
        let Value::Object(fields) = data else {
            return Err(StoreError::InvalidDocument);
        };
        let mut lock = self.lock().await?;
        let result = self.create_user_locked(fields).await;
        lock.release().await;
        result
    }

    async fn create_user_locked(&self, mut fields: Map<String, Value>) -> StoreResult<Value> {
        let mut document = self.read_unlocked().await?;
        let id = document.next_user_id();
        let now = Utc::now().to_rfc3339();
        fields.insert("id".to_string(), json!(id.as_u64()));
        fields.insert("created_at".to_string(), Value::String(now.clone()));
        fields.insert("updated_at".to_string(), Value::String(now));

        let record = Value::Object(fields);
        document.users.push(record.clone());
        self.write_unlocked(document).await?;
        info!(%id, "user created");
        Ok(record)
    }

    /// Shallow-merges `updates` over the user with the given id, refreshes
    /// `updated_at`, and returns the updated record.
    ///
    /// Fails with [`StoreError::NotFound`] if no record matches.
    pub async fn update_user(&self, id: UserId, updates: Value) -> StoreResult<Value> {
        let Value::Object(updates) = updates else {
            return Err(StoreError::InvalidDocument);
        };
        let mut lock = self.lock().await?;
        let result = self.update_user_locked(id, updates).await;
        lock.release().await;
        result
    }

    async fn update_user_locked(
        &self,
        id: UserId,
        updates: Map<String, Value>,
    ) -> StoreResult<Value> {
        let mut document = self.read_unlocked().await?;
        let index = document
            .find_user_index(id)
            .ok_or(StoreError::NotFound(id))?;

        if let Value::Object(fields) = &mut document.users[index] {
            for (key, value) in updates {
                fields.insert(key, value);
            }
            fields.insert(
                "updated_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        let updated = document.users[index].clone();

        self.write_unlocked(document).await?;
        info!(%id, "user updated");
        Ok(updated)
    }

    /// Removes the user with the given id and returns the removed record.
    ///
    /// Fails with [`StoreError::NotFound`] if no record matches.
    pub async fn delete_user(&self, id: UserId) -> StoreResult<Value> {
        let mut lock = self.lock().await?;
        let result = self.delete_user_locked(id).await;
        lock.release().await;
        result
    }

    async fn delete_user_locked(&self, id: UserId) -> StoreResult<Value> {
        let mut document = self.read_unlocked().await?;
        let index = document
            .find_user_index(id)
            .ok_or(StoreError::NotFound(id))?;
        let removed = document.users.remove(index);

        self.write_unlocked(document).await?;
        info!(%id, "user deleted");
        Ok(removed)
    }
}
