//! User directory behaviour over a real SeaORM store.
//!
//! Each test runs on a fresh in-memory SQLite database with roles
//! `r1` = ADMIN and `r2` = MEMBER seeded.

mod common;

use chrono::{Duration, TimeZone, Utc};
use user_directory::{
    contract::model::{UserPatch, UserStatus},
    domain::error::DomainError,
};

use common::{
    fixture, insert_user_row, new_user, set_stored_email, stored_user, user_count, ADMIN, MEMBER,
};

#[tokio::test]
async fn empty_directory_lists_as_not_found() {
    let fx = fixture().await;
    assert_eq!(fx.directory.list_users(None).await, Err(DomainError::NoUsers));
}

#[tokio::test]
async fn list_honours_limit_default_and_order() {
    let fx = fixture().await;
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for i in 0..12 {
        insert_user_row(
            &fx.db,
            &format!("id-{:02}", 11 - i),
            &format!("user{i}"),
            base + Duration::minutes(i),
            None,
        )
        .await;
    }

    assert_eq!(fx.directory.list_users(Some(5)).await.unwrap().len(), 5);
    assert_eq!(fx.directory.list_users(None).await.unwrap().len(), 10);
    assert_eq!(fx.directory.list_users(Some(0)).await.unwrap().len(), 10);

    let all = fx.directory.list_users(Some(50)).await.unwrap();
    assert_eq!(all.len(), 12);
    let names: Vec<_> = all.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names.first(), Some(&"user0"));
    assert_eq!(names.last(), Some(&"user11"));
}

#[tokio::test]
async fn admin_creates_user_with_string_status() {
    let fx = fixture().await;

    let id = fx
        .directory
        .create_user(new_user("alice", "alice@example.com", 1), ADMIN)
        .await
        .unwrap();

    let row = stored_user(&fx.db, &id).await.expect("row exists");
    assert_eq!(row.username, "alice");
    assert_eq!(row.status, "1");
    assert_eq!(row.role_id, ADMIN, "role defaults to the acting role");
    assert!(row.updated_at.is_some());

    let mut explicit = new_user("bob", "bob@example.com", 0);
    explicit.role_id = Some(MEMBER.to_string());
    let bob = fx.directory.create_user(explicit, ADMIN).await.unwrap();
    assert_eq!(stored_user(&fx.db, &bob).await.unwrap().role_id, MEMBER);
}

#[tokio::test]
async fn member_cannot_create_even_with_invalid_payload() {
    let fx = fixture().await;

    let valid = fx
        .directory
        .create_user(new_user("bob", "b@x.com", 1), MEMBER)
        .await;
    assert_eq!(valid, Err(DomainError::forbidden("MEMBER")));

    let invalid = fx.directory.create_user(new_user("", "nope", 1), MEMBER).await;
    assert_eq!(invalid, Err(DomainError::forbidden("MEMBER")));

    assert_eq!(user_count(&fx.db).await, 0);
}

#[tokio::test]
async fn unresolvable_role_is_unauthorized() {
    let fx = fixture().await;
    for role in ["zzz", ""] {
        let res = fx
            .directory
            .create_user(new_user("bob", "b@x.com", 1), role)
            .await;
        assert_eq!(res, Err(DomainError::unauthorized(role)));
    }
    assert_eq!(user_count(&fx.db).await, 0);
}

#[tokio::test]
async fn create_validates_fields_and_target_role() {
    let fx = fixture().await;

    let no_name = fx.directory.create_user(new_user(" ", "a@b.c", 1), ADMIN).await;
    assert!(matches!(no_name, Err(DomainError::InvalidArgument { ref field, .. }) if field == "username"));

    let bad_email = fx.directory.create_user(new_user("ann", "ann.example.com", 1), ADMIN).await;
    assert!(matches!(bad_email, Err(DomainError::InvalidArgument { ref field, .. }) if field == "email"));

    let mut unknown_role = new_user("ann", "ann@example.com", 1);
    unknown_role.role_id = Some("ghost".to_string());
    let res = fx.directory.create_user(unknown_role, ADMIN).await;
    assert!(matches!(res, Err(DomainError::InvalidArgument { ref field, .. }) if field == "role_id"));

    assert_eq!(user_count(&fx.db).await, 0);
}

#[tokio::test]
async fn edit_with_only_email_changes_only_email() {
    let fx = fixture().await;
    let id = fx
        .directory
        .create_user(new_user("u1", "old@x.com", 2), ADMIN)
        .await
        .unwrap();
    let before = fx.directory.list_users(None).await.unwrap().remove(0);

    let patch = UserPatch {
        id: id.clone(),
        email: Some("new@x.com".to_string()),
        ..Default::default()
    };
    let edited = fx.directory.edit_user(patch.clone(), ADMIN).await.unwrap();

    assert_eq!(edited.email, "new@x.com");
    assert_eq!(edited.username, before.username);
    assert_eq!(edited.status, before.status);
    assert_eq!(edited.role_id, before.role_id);
    assert_eq!(edited.created_at, before.created_at);
    assert!(edited.updated_at > before.updated_at);

    // Same patch again: same fields, still a later stamp.
    let again = fx.directory.edit_user(patch, ADMIN).await.unwrap();
    assert_eq!(
        (&again.username, &again.email, again.status, &again.role_id),
        (&edited.username, &edited.email, edited.status, &edited.role_id)
    );
    assert!(again.updated_at > edited.updated_at);

    let stored = fx.directory.list_users(None).await.unwrap().remove(0);
    assert_eq!(stored, again);
}

#[tokio::test]
async fn blank_patch_fields_keep_stored_values() {
    let fx = fixture().await;
    let id = fx
        .directory
        .create_user(new_user("carol", "carol@x.com", 4), ADMIN)
        .await
        .unwrap();

    let patch = UserPatch {
        id: id.clone(),
        username: Some(String::new()),
        email: Some(String::new()),
        status: Some(UserStatus::new(5)),
        role_id: Some(MEMBER.to_string()),
    };
    let edited = fx.directory.edit_user(patch, ADMIN).await.unwrap();
    assert_eq!(edited.username, "carol");
    assert_eq!(edited.email, "carol@x.com");
    assert_eq!(edited.status, UserStatus::new(5));
    assert_eq!(edited.role_id, MEMBER);

    let row = stored_user(&fx.db, &id).await.unwrap();
    assert_eq!(row.status, "5");
}

#[tokio::test]
async fn edit_checks_run_in_order() {
    let fx = fixture().await;
    let id = fx
        .directory
        .create_user(new_user("dave", "dave@x.com", 1), ADMIN)
        .await
        .unwrap();

    let empty = UserPatch::default();
    assert!(matches!(
        fx.directory.edit_user(empty, "zzz").await,
        Err(DomainError::InvalidArgument { .. })
    ));

    let existing = UserPatch {
        id: id.clone(),
        email: Some("x@x.com".into()),
        ..Default::default()
    };
    assert_eq!(
        fx.directory.edit_user(existing.clone(), "zzz").await,
        Err(DomainError::unauthorized("zzz"))
    );

    let missing = UserPatch {
        id: "ghost".into(),
        ..Default::default()
    };
    assert_eq!(
        fx.directory.edit_user(missing.clone(), ADMIN).await,
        Err(DomainError::user_not_found("ghost"))
    );
    // A member on a missing user still sees NotFound first.
    assert_eq!(
        fx.directory.edit_user(missing, MEMBER).await,
        Err(DomainError::user_not_found("ghost"))
    );

    assert_eq!(
        fx.directory.edit_user(existing, MEMBER).await,
        Err(DomainError::forbidden("MEMBER"))
    );
    assert_eq!(stored_user(&fx.db, &id).await.unwrap().email, "dave@x.com");

    let bad_role = UserPatch {
        id,
        role_id: Some("ghost-role".into()),
        ..Default::default()
    };
    assert!(matches!(
        fx.directory.edit_user(bad_role, ADMIN).await,
        Err(DomainError::InvalidArgument { ref field, .. }) if field == "role_id"
    ));
}

#[tokio::test]
async fn edit_of_row_without_updated_at_gets_a_later_stamp() {
    let fx = fixture().await;
    let created = Utc.with_ymd_and_hms(2023, 6, 1, 8, 0, 0).unwrap();
    insert_user_row(&fx.db, "legacy", "legacy", created, None).await;

    let listed = fx.directory.list_users(None).await.unwrap().remove(0);
    assert_eq!(listed.updated_at, created);

    let edited = fx
        .directory
        .edit_user(
            UserPatch {
                id: "legacy".into(),
                status: Some(UserStatus::new(0)),
                ..Default::default()
            },
            ADMIN,
        )
        .await
        .unwrap();
    assert!(edited.updated_at > created);
}

#[tokio::test]
async fn rename_keeps_a_stored_email_that_would_not_validate() {
    let fx = fixture().await;
    let created = Utc.with_ymd_and_hms(2022, 3, 4, 5, 6, 7).unwrap();
    insert_user_row(&fx.db, "u1", "old-name", created, None).await;
    set_stored_email(&fx.db, "u1", "legacy").await;

    let edited = fx
        .directory
        .edit_user(
            UserPatch {
                id: "u1".into(),
                username: Some("renamed".into()),
                ..Default::default()
            },
            ADMIN,
        )
        .await
        .unwrap();
    assert_eq!(edited.username, "renamed");
    assert_eq!(edited.email, "legacy");

    let row = stored_user(&fx.db, "u1").await.unwrap();
    assert_eq!(row.username, "renamed");
    assert_eq!(row.email, "legacy");

    // A supplied email is still checked.
    let res = fx
        .directory
        .edit_user(
            UserPatch {
                id: "u1".into(),
                email: Some("still-not-an-email".into()),
                ..Default::default()
            },
            ADMIN,
        )
        .await;
    assert!(matches!(res, Err(DomainError::InvalidArgument { ref field, .. }) if field == "email"));
}

#[tokio::test]
async fn delete_removes_the_row_once() {
    let fx = fixture().await;
    let id = fx
        .directory
        .create_user(new_user("erin", "erin@x.com", 1), ADMIN)
        .await
        .unwrap();

    assert_eq!(
        fx.directory.delete_user(&id, MEMBER).await,
        Err(DomainError::forbidden("MEMBER"))
    );
    assert_eq!(user_count(&fx.db).await, 1);

    assert_eq!(fx.directory.delete_user(&id, ADMIN).await, Ok(id.clone()));
    assert_eq!(user_count(&fx.db).await, 0);
    assert_eq!(
        fx.directory.delete_user(&id, ADMIN).await,
        Err(DomainError::user_not_found(id.as_str()))
    );
    assert!(matches!(
        fx.directory.delete_user("", ADMIN).await,
        Err(DomainError::InvalidArgument { .. })
    ));
}
