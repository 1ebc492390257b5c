use uuid::Uuid;

use crate::error::AppError;
use crate::models::Post;

pub type PermissionResult = Result<(), AppError>;

pub fn check_account_ownership(actor_id: Uuid, account_id: Uuid) -> PermissionResult {
    if actor_id == account_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this user".to_string(),
        ))
    }
}

pub fn check_post_ownership(actor_id: Uuid, post: &Post) -> PermissionResult {
    if post.user_id == actor_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this post".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn owner_checks() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let post = Post {
            id: Uuid::new_v4(),
            user_id: owner,
            image_url: "https://cdn.example.com/a.jpg".into(),
            caption: "a".into(),
            created_at: Utc::now(),
        };

        assert!(check_post_ownership(owner, &post).is_ok());
        assert!(matches!(
            check_post_ownership(other, &post),
            Err(AppError::Forbidden(_))
        ));
        assert!(check_account_ownership(owner, owner).is_ok());
        assert!(check_account_ownership(other, owner).is_err());
    }
}
