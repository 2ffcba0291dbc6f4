use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::AppError;
use crate::models::{Meeting, User};

use super::MeetingRepository;

#[derive(Default)]
pub struct InMemoryRepository {
    meetings: Mutex<Vec<Meeting>>,
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryRepository {
    pub fn meetings(&self) -> Vec<Meeting> {
        self.meetings
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

fn poisoned(store: &str) -> AppError {
    AppError::Internal(anyhow::anyhow!("{store} poisoned"))
}

impl MeetingRepository for InMemoryRepository {
    fn save_meeting(&self, meeting: &Meeting) -> Result<(), AppError> {
        tracing::debug!(id = %meeting.id, "save_meeting (in memory)");
        self.meetings
            .lock()
            .map_err(|_| poisoned("meeting store"))?
            .push(meeting.clone());
        Ok(())
    }

    fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.users
            .lock()
            .map_err(|_| poisoned("user store"))?
            .insert(user.email.clone(), user.clone());
        Ok(())
    }

    fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self
            .users
            .lock()
            .map_err(|_| poisoned("user store"))?;
        Ok(users.get(email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_users_round_trip() {
        let repo = InMemoryRepository::default();
        assert!(repo.get_user("a@b.io").unwrap().is_none());

        let user = User {
            email: "a@b.io".to_string(),
            display_name: Some("A".to_string()),
            created_at: Utc::now().naive_utc(),
        };
        repo.save_user(&user).unwrap();
        assert_eq!(repo.get_user("a@b.io").unwrap(), Some(user));
    }
}
