//! Integration tests for registration and user draw management

mod common;

use ::common::crypto::{KeyError, KeyPairProvider, Keypair};
use ::common::draw::NewDraw;
use ::common::lottery::{Lottery, LotteryError};
use ::common::store::{DrawStore, MemoryDrawStore, StoreError};
use ::common::user::{Registration, Role};

#[derive(Debug)]
struct BrokenKeys;

impl KeyPairProvider for BrokenKeys {
    fn generate(&self) -> Result<Keypair, KeyError> {
        Err(anyhow::anyhow!("entropy unavailable").into())
    }
}

#[tokio::test]
async fn test_submit_draw_is_sealed() {
    let (lottery, _admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;

    let numbers = common::numbers([9, 1, 44, 12, 30, 2]);
    let draw = lottery.submit_draw(&alice, &numbers).await.unwrap();
    assert_eq!(draw.owner, alice.id);
    assert!(!draw.is_master);
    assert!(!draw.been_played);
    assert_eq!(draw.round, 0);

    let revealed = draw.reveal(alice.keypair.secret()).unwrap();
    assert_eq!(revealed.numbers, numbers);
    assert_eq!(revealed.numbers.to_string(), "1 2 9 12 30 44");
}

#[tokio::test]
async fn test_submit_without_open_round() {
    let (lottery, _admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;

    lottery
        .submit_draw(&alice, &common::numbers([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();
    assert_eq!(lottery.playable_draws(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_playable_and_played_draws() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;
    let bob = common::player(&lottery, "b@example.com").await;

    lottery.rounds().publish_round(&admin).await.unwrap();
    lottery
        .submit_draw(&alice, &common::winning())
        .await
        .unwrap();
    lottery
        .submit_draw(&bob, &common::numbers([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();

    let playable = lottery.playable_draws(&alice).await.unwrap();
    assert_eq!(playable.len(), 1);
    assert_eq!(playable[0].numbers, common::winning());
    assert!(lottery.played_draws(&alice).await.unwrap().is_empty());

    lottery.rounds().settle_round(&admin).await.unwrap();
    lottery
        .submit_draw(&alice, &common::numbers([10, 11, 12, 13, 14, 15]))
        .await
        .unwrap();

    let played = lottery.played_draws(&alice).await.unwrap();
    assert_eq!(played.len(), 1);
    assert!(played[0].matches_master);
    assert_eq!(played[0].round, 1);

    let playable = lottery.playable_draws(&alice).await.unwrap();
    assert_eq!(playable.len(), 1);
    assert_eq!(playable[0].numbers.to_string(), "10 11 12 13 14 15");

    let bob_played = lottery.played_draws(&bob).await.unwrap();
    assert_eq!(bob_played.len(), 1);
    assert!(!bob_played[0].matches_master);
}

#[tokio::test]
async fn test_unreadable_draw_left_out_of_listing() {
    let (lottery, _admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;

    let good = lottery
        .submit_draw(&alice, &common::winning())
        .await
        .unwrap();

    // filed under alice but sealed to another player's key
    let mut stranger = alice.clone();
    stranger.keypair = common::player(&lottery, "c@example.com").await.keypair;
    lottery
        .store()
        .insert_draw(NewDraw::user(&stranger, &common::numbers([1, 2, 3, 4, 5, 6])).unwrap())
        .await
        .unwrap();

    let playable = lottery.playable_draws(&alice).await.unwrap();
    assert_eq!(playable.len(), 1);
    assert_eq!(playable[0].id, good.id);
    assert_eq!(playable[0].numbers, common::winning());
}

#[tokio::test]
async fn test_clear_played_keeps_pending() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;
    let bob = common::player(&lottery, "b@example.com").await;

    lottery.rounds().publish_round(&admin).await.unwrap();
    lottery
        .submit_draw(&alice, &common::numbers([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();
    lottery
        .submit_draw(&bob, &common::numbers([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();
    lottery.rounds().settle_round(&admin).await.unwrap();
    lottery
        .submit_draw(&alice, &common::numbers([7, 8, 9, 10, 11, 12]))
        .await
        .unwrap();

    assert_eq!(lottery.clear_played(&alice).await.unwrap(), 1);
    assert!(lottery.played_draws(&alice).await.unwrap().is_empty());
    assert_eq!(lottery.playable_draws(&alice).await.unwrap().len(), 1);
    // other users are untouched
    assert_eq!(lottery.played_draws(&bob).await.unwrap().len(), 1);
    // and so is the played master
    assert!(lottery.store().latest_master().await.unwrap().is_some());

    assert_eq!(lottery.clear_played(&alice).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let (lottery, _admin) = common::setup_test_env().await;
    common::player(&lottery, "a@example.com").await;

    let result = lottery
        .register_user(Registration::new("  A@Example.com ", "Other", "Person"))
        .await;
    assert!(matches!(
        result,
        Err(LotteryError::Store(StoreError::EmailTaken(_)))
    ));
}

#[tokio::test]
async fn test_identity_lookup() {
    let (lottery, admin) = common::setup_test_env().await;

    let found = lottery.identity("admin@email.com").await.unwrap();
    assert_eq!(found.id, admin.id);
    assert!(found.is_admin());
    assert_eq!(found.public_key(), admin.public_key());

    assert!(matches!(
        lottery.identity("nobody@email.com").await,
        Err(LotteryError::UnknownUser(_))
    ));
}

#[tokio::test]
async fn test_bootstrap_only_once() {
    let (lottery, _admin) = common::setup_test_env().await;

    let result = lottery
        .bootstrap_admin(Registration::new("second@email.com", "Eve", "Admin"))
        .await;
    assert!(matches!(result, Err(LotteryError::AlreadyBootstrapped)));
}

#[tokio::test]
async fn test_register_admin_requires_admin() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;

    let result = lottery
        .register_admin(&alice, Registration::new("c@example.com", "Carol", "Lee"))
        .await;
    assert!(matches!(result, Err(LotteryError::Forbidden(_))));

    let carol = lottery
        .register_admin(&admin, Registration::new("c@example.com", "Carol", "Lee"))
        .await
        .unwrap();
    assert_eq!(carol.role, Role::Admin);
}

#[tokio::test]
async fn test_list_users_by_role() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;
    common::player(&lottery, "b@example.com").await;

    assert_eq!(lottery.users(&admin, None).await.unwrap().len(), 3);
    assert_eq!(
        lottery.users(&admin, Some(Role::User)).await.unwrap().len(),
        2
    );
    let admins = lottery.users(&admin, Some(Role::Admin)).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].email, "admin@email.com");

    assert!(matches!(
        lottery.users(&alice, None).await,
        Err(LotteryError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_key_generation_failure_abandons_registration() {
    let store = MemoryDrawStore::new();
    let lottery = Lottery::new(store.clone()).with_key_provider(BrokenKeys);

    let result = lottery
        .register_user(Registration::new("a@example.com", "Ann", "Lee"))
        .await;
    assert!(matches!(result, Err(LotteryError::KeyGeneration(_))));
    assert!(store.users(None).await.unwrap().is_empty());
}
