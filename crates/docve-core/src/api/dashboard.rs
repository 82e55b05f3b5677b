//! Admin dashboard queries.
//!
//! Several of these endpoints are optional on the service side, so each
//! query has a fallback built from the endpoints that always exist.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{ActivityEntry, DashboardStats, User, UserQuery};

use super::{ApiClient, ApiError};

/// Number of users the activity fallback is built from.
const ACTIVITY_FALLBACK_USERS: usize = 3;

/// Interpret a count-ish JSON value: a number, an array (its length) or an
/// object with a `count`/`total` field.
pub fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::Array(items) => Some(items.len() as u64),
        Value::Object(map) => ["count", "total", "totalCount"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Newest first; users without a parseable timestamp sort last.
fn sort_newest_first(users: &mut [User]) {
    users.sort_by(|a, b| b.created().cmp(&a.created()));
}

fn activity_from_users(users: &[User]) -> Vec<ActivityEntry> {
    users
        .iter()
        .map(|user| ActivityEntry {
            admin: "System".to_string(),
            action: format!(
                "Created new user: {}",
                user.email
                    .clone()
                    .or_else(|| user.username.clone())
                    .unwrap_or_default()
            ),
            time: user
                .created_at
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
        })
        .collect()
}

impl ApiClient {
    /// Total number of users (`/Users/count`).
    pub async fn users_count(&self) -> Result<u64, ApiError> {
        let value = self.users_count_raw().await?;
        count_from_value(&value)
            .ok_or_else(|| ApiError::InvalidResponse(format!("Expected a user count, got {}", value)))
    }

    /// Users active today. Falls back to the total count when the service
    /// does not support the `active` filter.
    pub async fn active_users_count(&self) -> Result<u64, ApiError> {
        match self.users_raw(&UserQuery::active()).await {
            Ok(value) => Ok(count_from_value(&value).unwrap_or(0)),
            Err(e) if e.is_unauthorized() || e.is_cancelled() => Err(e),
            Err(e) => {
                debug!(error = %e, "Active user filter unavailable, using total count");
                self.users_count().await
            }
        }
    }

    /// Number of documents across all shelves. A non-array body counts as 0.
    pub async fn documents_count(&self) -> Result<u64, ApiError> {
        let response = self.send(self.request(reqwest::Method::GET, "/Documents")).await?;
        let value: Value = Self::read_json(response).await?;
        Ok(value.as_array().map(|docs| docs.len() as u64).unwrap_or(0))
    }

    /// Most recently created users. Falls back to sorting the full list
    /// client-side when the service ignores sort parameters.
    pub async fn recent_users(&self, limit: usize) -> Result<Vec<User>, ApiError> {
        match self.users(&UserQuery::recent(limit)).await {
            Ok(users) => Ok(users),
            Err(e) if e.is_unauthorized() || e.is_cancelled() => Err(e),
            Err(e) => {
                debug!(error = %e, "Sorted user query failed, sorting locally");
                let mut users = self.users(&UserQuery::default()).await?;
                sort_newest_first(&mut users);
                users.truncate(limit);
                Ok(users)
            }
        }
    }

    /// Recent admin activity. When the service has no activity log, the
    /// newest accounts are reported as "Created new user" entries.
    pub async fn recent_activity(&self) -> Result<Vec<ActivityEntry>, ApiError> {
        let response = self
            .send(
                self.request(reqwest::Method::GET, "/Activity/recent")
                    .query(&[("limit", 10)]),
            )
            .await;
        let fetched = match response {
            Ok(response) => Self::read_json::<Vec<ActivityEntry>>(response).await,
            Err(e) => Err(e),
        };
        match fetched {
            Ok(entries) => Ok(entries),
            Err(e) if e.is_unauthorized() || e.is_cancelled() => Err(e),
            Err(e) => {
                debug!(error = %e, "Activity log unavailable, using recent users");
                let users = self.recent_users(ACTIVITY_FALLBACK_USERS).await?;
                Ok(activity_from_users(&users))
            }
        }
    }

    /// All dashboard figures. The three counts are fetched concurrently and
    /// any failure fails the whole call; health is best-effort.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let counts = futures::future::try_join3(
            self.users_count(),
            self.active_users_count(),
            self.documents_count(),
        );
        let (counts, health) = tokio::join!(counts, self.health());
        let (total_users, active_users, documents_processed) = counts?;

        let health = match health {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Health check failed");
                None
            }
        };

        Ok(DashboardStats::new(
            total_users,
            active_users,
            documents_processed,
            health,
        ))
    }
}
