//! Integration tests for settling a round

mod common;

use ::common::draw::NewDraw;
use ::common::round::RoundError;
use ::common::store::{DrawFilter, DrawStore};

#[tokio::test]
async fn test_winner_and_loser() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;
    let bob = common::player(&lottery, "b@example.com").await;

    let master = lottery.rounds().publish_round(&admin).await.unwrap();
    let a = lottery
        .submit_draw(&alice, &common::numbers([59, 40, 3, 51, 22, 17]))
        .await
        .unwrap();
    let b = lottery
        .submit_draw(&bob, &common::numbers([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();

    let settlement = lottery.rounds().settle_round(&admin).await.unwrap();
    assert_eq!(settlement.round, 1);
    assert_eq!(settlement.settled, 2);
    assert!(settlement.failures.is_empty());
    assert_eq!(settlement.winners.len(), 1);
    let winner = &settlement.winners[0];
    assert_eq!(winner.user_id, alice.id);
    assert_eq!(winner.email, "a@example.com");
    assert_eq!(winner.round, 1);
    assert_eq!(winner.numbers, common::winning());

    let draws = lottery.store().draws(DrawFilter::default()).await.unwrap();
    let find = |id| draws.iter().find(|d| d.id == id).unwrap();

    let a = find(a.id);
    assert!(a.been_played && a.matches_master);
    assert_eq!(a.round, 1);

    let b = find(b.id);
    assert!(b.been_played && !b.matches_master);
    assert_eq!(b.round, 1);

    let master = find(master.id);
    assert!(master.been_played);
    assert!(!master.matches_master);
}

#[tokio::test]
async fn test_no_winners_is_not_an_error() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;

    lottery.rounds().publish_round(&admin).await.unwrap();
    lottery
        .submit_draw(&alice, &common::numbers([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();

    let settlement = lottery.rounds().settle_round(&admin).await.unwrap();
    assert!(!settlement.has_winners());
    assert_eq!(settlement.settled, 1);
}

#[tokio::test]
async fn test_no_pending_draws_keeps_round_open() {
    let (lottery, admin) = common::setup_test_env().await;
    let master = lottery.rounds().publish_round(&admin).await.unwrap();

    let result = lottery.rounds().settle_round(&admin).await;
    assert!(matches!(result, Err(RoundError::NoPendingDraws(1))));
    assert!(result.unwrap_err().is_informational());

    let current = lottery.store().current_master().await.unwrap().unwrap();
    assert_eq!(current.id, master.id);
    assert!(!current.been_played);
}

#[tokio::test]
async fn test_no_active_round_mutates_nothing() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;

    // never published
    lottery
        .submit_draw(&alice, &common::numbers([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();
    let before = lottery.store().draws(DrawFilter::default()).await.unwrap();
    assert!(matches!(
        lottery.rounds().settle_round(&admin).await,
        Err(RoundError::NoActiveRound)
    ));
    assert_eq!(
        lottery.store().draws(DrawFilter::default()).await.unwrap(),
        before
    );

    // already settled
    lottery.rounds().publish_round(&admin).await.unwrap();
    lottery.rounds().settle_round(&admin).await.unwrap();
    lottery
        .submit_draw(&alice, &common::numbers([7, 8, 9, 10, 11, 12]))
        .await
        .unwrap();

    let before = lottery.store().draws(DrawFilter::default()).await.unwrap();
    let result = lottery.rounds().settle_round(&admin).await;
    assert!(matches!(result, Err(RoundError::NoActiveRound)));
    assert_eq!(
        lottery.store().draws(DrawFilter::default()).await.unwrap(),
        before
    );
}

#[tokio::test]
async fn test_matching_is_order_independent() {
    let orderings = [
        [3, 17, 22, 40, 51, 59],
        [59, 51, 40, 22, 17, 3],
        [22, 59, 3, 40, 17, 51],
    ];

    for ordering in orderings {
        let (lottery, admin) = common::setup_test_env().await;
        let alice = common::player(&lottery, "a@example.com").await;

        lottery.rounds().publish_round(&admin).await.unwrap();
        lottery
            .submit_draw(&alice, &common::numbers(ordering))
            .await
            .unwrap();

        let settlement = lottery.rounds().settle_round(&admin).await.unwrap();
        assert_eq!(settlement.winners.len(), 1, "ordering {:?}", ordering);
    }
}

#[tokio::test]
async fn test_undecryptable_draw_does_not_abort_batch() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;
    let bob = common::player(&lottery, "b@example.com").await;

    lottery.rounds().publish_round(&admin).await.unwrap();
    let good = lottery
        .submit_draw(&alice, &common::numbers([3, 17, 22, 40, 51, 59]))
        .await
        .unwrap();

    // a draw filed under bob but sealed to somebody else's key
    let mut imposter = bob.clone();
    imposter.keypair = common::player(&lottery, "c@example.com").await.keypair;
    let broken = lottery
        .store()
        .insert_draw(NewDraw::user(&imposter, &common::numbers([1, 2, 3, 4, 5, 6])).unwrap())
        .await
        .unwrap();
    let later = lottery
        .submit_draw(&bob, &common::numbers([3, 17, 22, 40, 51, 59]))
        .await
        .unwrap();

    let settlement = lottery.rounds().settle_round(&admin).await.unwrap();
    assert_eq!(settlement.settled, 2);
    assert_eq!(settlement.failures.len(), 1);
    assert_eq!(settlement.failures[0].draw_id, broken.id);

    let winners: Vec<_> = settlement.winners.iter().map(|w| w.user_id).collect();
    assert_eq!(winners, vec![alice.id, bob.id]);

    let pending = lottery.store().pending_draws().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, broken.id);

    let settled = lottery
        .store()
        .draws(DrawFilter::default().master(false).played(true))
        .await
        .unwrap();
    let ids: Vec<_> = settled.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![good.id, later.id]);
}

#[tokio::test]
async fn test_only_admins_settle() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;
    lottery.rounds().publish_round(&admin).await.unwrap();
    lottery
        .submit_draw(&alice, &common::numbers([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();

    assert!(matches!(
        lottery.rounds().settle_round(&alice).await,
        Err(RoundError::Forbidden(_))
    ));
    assert!(lottery.store().current_master().await.unwrap().is_some());
}

#[tokio::test]
async fn test_draws_settle_once() {
    let (lottery, admin) = common::setup_test_env().await;
    let alice = common::player(&lottery, "a@example.com").await;

    lottery.rounds().publish_round(&admin).await.unwrap();
    lottery
        .submit_draw(&alice, &common::numbers([3, 17, 22, 40, 51, 59]))
        .await
        .unwrap();
    lottery.rounds().settle_round(&admin).await.unwrap();

    // next round: the settled draw is not pending any more
    lottery.rounds().publish_round(&admin).await.unwrap();
    let result = lottery.rounds().settle_round(&admin).await;
    assert!(matches!(result, Err(RoundError::NoPendingDraws(2))));

    let played = lottery.played_draws(&alice).await.unwrap();
    assert_eq!(played.len(), 1);
    assert_eq!(played[0].round, 1);
    assert!(played[0].matches_master);
}

#[tokio::test]
async fn test_parallel_settlement_many_draws() {
    let (lottery, admin) = common::setup_test_env().await;
    let lottery = lottery.with_settle_concurrency(4);
    lottery.rounds().publish_round(&admin).await.unwrap();

    let mut expected_winners = Vec::new();
    for i in 0..20u32 {
        let player = common::player(&lottery, &format!("p{}@example.com", i)).await;
        let numbers = if i % 5 == 0 {
            expected_winners.push(player.id);
            common::winning()
        } else {
            common::numbers([1, 2, 3, 4, 5, 6 + i])
        };
        lottery.submit_draw(&player, &numbers).await.unwrap();
    }

    let settlement = lottery.rounds().settle_round(&admin).await.unwrap();
    assert_eq!(settlement.settled, 20);
    let winners: Vec<_> = settlement.winners.iter().map(|w| w.user_id).collect();
    assert_eq!(winners, expected_winners);
}
