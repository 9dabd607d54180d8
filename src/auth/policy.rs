//! Access policy: pure, total predicates over a principal and a target.
//!
//! Callers translate `false` into the right rejection: 401 when anonymous
//! where auth is mandatory, 403 when authenticated but lacking permission.

use crate::entities::bookmarks;

use super::identity::Principal;

/// Public bookmarks are readable by anyone; private ones only by their owner
/// or an admin.
#[must_use]
pub fn can_read_bookmark(principal: &Principal, bookmark: &bookmarks::Model) -> bool {
    if bookmark.is_public {
        return true;
    }

    principal
        .user()
        .is_some_and(|u| u.id == bookmark.user_id || u.is_admin)
}

/// Writes (update/delete) require ownership or the admin flag. Anonymous is
/// always denied.
#[must_use]
pub fn can_write_bookmark(principal: &Principal, bookmark: &bookmarks::Model) -> bool {
    principal
        .user()
        .is_some_and(|u| u.id == bookmark.user_id || u.is_admin)
}

/// Any authenticated user may list their own private bookmarks. This is not
/// a permission to list other users' private collections.
#[must_use]
pub fn can_list_private(principal: &Principal) -> bool {
    principal.user().is_some()
}

#[must_use]
pub fn can_administer(principal: &Principal) -> bool {
    principal.user().is_some_and(|u| u.is_admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::AuthMode;
    use crate::db::User;

    fn user(id: i32, is_admin: bool) -> Principal {
        Principal::Authenticated {
            user: User {
                id,
                username: format!("user{id}"),
                email: format!("user{id}@example.com"),
                is_admin,
                created_at: String::new(),
                updated_at: String::new(),
            },
            mode: AuthMode::Session,
        }
    }

    fn bookmark(owner: i32, is_public: bool) -> bookmarks::Model {
        bookmarks::Model {
            id: 1,
            user_id: owner,
            title: "Rust Book".to_string(),
            url: "https://doc.rust-lang.org/book/".to_string(),
            description: None,
            is_public,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_read_private_bookmark() {
        let private = bookmark(7, false);

        assert!(!can_read_bookmark(&Principal::Anonymous, &private));
        assert!(can_read_bookmark(&user(7, false), &private));
        assert!(!can_read_bookmark(&user(8, false), &private));
        assert!(can_read_bookmark(&user(8, true), &private));
    }

    #[test]
    fn test_read_public_bookmark() {
        let public = bookmark(7, true);

        assert!(can_read_bookmark(&Principal::Anonymous, &public));
        assert!(can_read_bookmark(&user(8, false), &public));
    }

    #[test]
    fn test_write_requires_ownership_or_admin() {
        let target = bookmark(7, true);

        assert!(!can_write_bookmark(&Principal::Anonymous, &target));
        assert!(can_write_bookmark(&user(7, false), &target));
        assert!(!can_write_bookmark(&user(8, false), &target));
        assert!(can_write_bookmark(&user(8, true), &target));
    }

    #[test]
    fn test_list_private_and_administer() {
        assert!(!can_list_private(&Principal::Anonymous));
        assert!(can_list_private(&user(1, false)));

        assert!(!can_administer(&Principal::Anonymous));
        assert!(!can_administer(&user(1, false)));
        assert!(can_administer(&user(1, true)));
    }
}
