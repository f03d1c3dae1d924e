use crate::errors::ModelError;
use crate::{company, game_user_map, user, user_credentials};
use crate::user::UserChanges;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, PaginatorTrait, Set, TransactionTrait};
use anyhow::Result;
use chrono::{TimeZone, Utc};

use super::setup_test_db;

fn named(username: &str) -> UserChanges {
    UserChanges { username: Some(username.into()), first_name: Some("Ada".into()), last_name: None }
}

/// Test user CRUD operations
#[tokio::test]
async fn test_user_crud() -> Result<()> {
    let db = setup_test_db().await?;

    let created = user::create(&db, named("ada")).await?;
    assert_eq!(created.username, "ada");
    assert_eq!(created.first_name, "Ada");
    assert_eq!(created.last_name, "");
    assert!(created.is_active);

    let found = user::find_by_username(&db, "ada").await?.expect("found by username");
    assert_eq!(found.id, created.id);

    let updated = user::update(&db, created.id, UserChanges { last_name: Some("Lovelace".into()), ..Default::default() }).await?;
    assert_eq!(updated.username, "ada");
    assert_eq!(updated.last_name, "Lovelace");

    assert!(user::delete_cascade(&db, created.id).await?);
    assert!(!user::delete_cascade(&db, created.id).await?);
    assert!(user::Entity::find_by_id(created.id).one(&db).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_username_unique() -> Result<()> {
    let db = setup_test_db().await?;
    let a = user::create(&db, named("mario")).await?;
    let b = user::create(&db, named("luigi")).await?;

    match user::create(&db, named("mario")).await {
        Err(ModelError::Fields(f)) => assert_eq!(f.get("username"), Some(&[user::USERNAME_TAKEN.to_string()][..])),
        other => panic!("expected duplicate error, got {:?}", other),
    }
    // renaming onto someone else's username fails, keeping your own succeeds
    assert!(user::update(&db, b.id, named("mario")).await.is_err());
    assert!(user::update(&db, a.id, named("mario")).await.is_ok());
    Ok(())
}

/// A duplicate that slips past the lookup is reported by the unique index as a field error
#[tokio::test]
async fn test_unique_index_violation_is_username_taken() -> Result<()> {
    let db = setup_test_db().await?;
    user::create(&db, named("wario")).await?;

    let raced = user::ActiveModel {
        id: NotSet,
        username: Set("wario".into()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        is_active: Set(true),
        date_joined: Set(Utc::now().into()),
    };
    let err = raced.insert(&db).await.expect_err("unique index rejects duplicate");
    match user::write_error(err) {
        ModelError::Fields(f) => assert_eq!(f.get("username"), Some(&[user::USERNAME_TAKEN.to_string()][..])),
        other => panic!("expected username field error, got {:?}", other),
    }
    assert_eq!(user::Entity::find().count(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_update_missing_user() -> Result<()> {
    let db = setup_test_db().await?;
    let res = user::update(&db, 404, UserChanges::default()).await;
    assert!(matches!(res, Err(ModelError::NotFound(_))));
    Ok(())
}

/// Test game user map defaults and ownership
#[tokio::test]
async fn test_game_user_map_crud() -> Result<()> {
    let db = setup_test_db().await?;
    let owner = user::create(&db, named("peach")).await?;

    let before = Utc::now();
    let m = game_user_map::create(&db, owner.id, None, None).await?;
    assert_eq!(m.game, "");
    assert_eq!(m.user_id, owner.id);
    assert!(m.created_on.with_timezone(&Utc) >= before - chrono::Duration::seconds(1));

    let fixed = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
    let m2 = game_user_map::create(&db, owner.id, Some("kart"), Some(fixed.into())).await?;
    assert_eq!(m2.game, "kart");
    assert_eq!(m2.created_on.with_timezone(&Utc), fixed);

    let updated = game_user_map::update(&db, m.id, Some("tennis"), None).await?;
    assert_eq!(updated.game, "tennis");
    assert_eq!(updated.user_id, owner.id);

    let all = game_user_map::list_with_owner(&db).await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].0.id, m.id);
    assert_eq!(all[0].1.as_ref().map(|u| u.username.as_str()), Some("peach"));

    let one = game_user_map::find_with_owner(&db, m2.id).await?.expect("found");
    assert_eq!(one.0.game, "kart");
    assert!(game_user_map::find_with_owner(&db, 999).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_game_too_long_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let owner = user::create(&db, named("toad")).await?;
    let long = "x".repeat(game_user_map::GAME_MAX_LEN + 1);
    assert!(matches!(
        game_user_map::create(&db, owner.id, Some(&long), None).await,
        Err(ModelError::Fields(_))
    ));
    assert_eq!(game_user_map::Entity::find().count(&db).await?, 0);
    Ok(())
}

/// Deleting a user removes its maps and credentials inside one transaction
#[tokio::test]
async fn test_delete_cascade_in_transaction() -> Result<()> {
    let db = setup_test_db().await?;
    let owner = user::create(&db, named("bowser")).await?;
    let other = user::create(&db, named("daisy")).await?;
    game_user_map::create(&db, owner.id, Some("a"), None).await?;
    game_user_map::create(&db, owner.id, Some("b"), None).await?;
    game_user_map::create(&db, other.id, Some("c"), None).await?;
    user_credentials::upsert_password(&db, owner.id, "$argon2id$fake".into(), "argon2").await?;

    let txn = db.begin().await?;
    assert!(user::delete_cascade(&txn, owner.id).await?);
    txn.commit().await?;

    let left = game_user_map::list_with_owner(&db).await?;
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].0.game, "c");
    assert!(user_credentials::find_for_user(&db, owner.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_upsert_password_replaces_hash() -> Result<()> {
    let db = setup_test_db().await?;
    let u = user::create(&db, named("yoshi")).await?;
    let first = user_credentials::upsert_password(&db, u.id, "h1".into(), "argon2").await?;
    let second = user_credentials::upsert_password(&db, u.id, "h2".into(), "argon2").await?;
    assert_eq!(first.id, second.id);
    assert_eq!(second.password_hash, "h2");
    assert!(user_credentials::upsert_password(&db, u.id, " ".into(), "argon2").await.is_err());
    Ok(())
}

/// Test company CRUD operations
#[tokio::test]
async fn test_company_crud() -> Result<()> {
    let db = setup_test_db().await?;
    let draft = company::CompanyForm {
        name: Some("Nintendo".into()),
        description: Some("Games".into()),
        created_on: Some("1889-09-23".into()),
    }
    .validate()
    .expect("valid form");

    let c = company::create(&db, draft).await?;
    assert_eq!(c.name, "Nintendo");

    let got = company::get(&db, c.id).await?.expect("exists");
    assert_eq!(got, c);
    assert!(company::get(&db, c.id + 1).await?.is_none());
    assert_eq!(company::list(&db).await?.len(), 1);
    Ok(())
}
