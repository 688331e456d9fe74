use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Comment, Post},
};

/// Owned
///
/// Anything with a single owning user. Implemented by the content entities
/// so the authorization rule stays one predicate, outside the entities
/// themselves and outside the storage layer.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Post {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// The entire authorization model: an actor may modify an entity iff they
/// own it. No roles, no delegation, no admin override.
pub fn can_modify(actor_id: Uuid, entity: &impl Owned) -> bool {
    entity.owner_id() == actor_id
}

/// Result-shaped form used on every mutating path: post edit/delete and
/// comment delete.
pub fn ensure_owner(actor_id: Uuid, owner_id: Uuid) -> Result<(), ApiError> {
    if actor_id == owner_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

pub fn ensure_can_modify(actor_id: Uuid, entity: &impl Owned) -> Result<(), ApiError> {
    ensure_owner(actor_id, entity.owner_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_owned_by(owner: Uuid) -> Post {
        Post {
            id: 1,
            user_id: owner,
            title: "t".to_string(),
            content: "c".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            author: None,
        }
    }

    #[test]
    fn owner_may_modify() {
        let owner = Uuid::new_v4();
        assert!(can_modify(owner, &post_owned_by(owner)));
        assert!(ensure_can_modify(owner, &post_owned_by(owner)).is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        assert!(!can_modify(stranger, &post_owned_by(owner)));
        assert_eq!(
            ensure_can_modify(stranger, &post_owned_by(owner)),
            Err(ApiError::Forbidden)
        );
    }

    #[test]
    fn comment_ownership_follows_the_same_rule() {
        let owner = Uuid::new_v4();
        let comment = Comment {
            id: 1,
            user_id: owner,
            post_id: 1,
            content: "hi".to_string(),
            created_at: Utc::now(),
            author: None,
        };
        assert!(can_modify(owner, &comment));
        assert!(!can_modify(Uuid::new_v4(), &comment));
    }
}
