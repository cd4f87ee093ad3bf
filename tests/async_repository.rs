//! The suspending façade mirrors the blocking one operation for operation;
//! these scenarios replay the core flows through `AsyncRepository`.

mod support;

use std::io::{Error as IoError, ErrorKind};

use chrono::Utc;
use rootstore::{
    same_entity, AggregateRoot, AsyncRepository, MemoryCollection, MemoryStore, Ordering, Page,
    Predicate, StoreError,
};
use support::Player;

fn players() -> (MemoryStore, AsyncRepository<Player, MemoryCollection<Player>>) {
    let store = MemoryStore::new();
    let repo = AsyncRepository::new(&store);
    (store, repo)
}

async fn seed(repo: &AsyncRepository<Player, MemoryCollection<Player>>) -> Vec<Player> {
    let mut squad = vec![
        Player::new("Ana", 22),
        Player::new("Bruno", 35),
        Player::new("Carla", 28),
    ];
    repo.insert_many(&mut squad).await.unwrap();
    squad
}

#[tokio::test]
async fn insert_update_get_scenario() {
    let (_, repo) = players();

    let mut carlos = Player::new("Carlos", 30);
    repo.insert(&mut carlos).await.unwrap();
    assert!(!carlos.id().is_empty());

    let fetched = repo.get(carlos.id()).await.unwrap().unwrap();
    assert_eq!(fetched.age, 30);
    assert!(fetched.modified_at().is_none());

    let issued_at = Utc::now();
    assert!(repo.update_field(carlos.id(), "age", 31).await.unwrap());

    let fetched = repo.get(carlos.id()).await.unwrap().unwrap();
    assert_eq!(fetched.age, 31);
    assert_eq!(fetched.created_at(), carlos.created_at());
    assert!(fetched.modified_at().unwrap() >= issued_at);
}

#[tokio::test]
async fn get_rejects_a_blank_id_before_the_store() {
    let (store, repo) = players();
    store.fail_next(StoreError::Query("unreached".into()));
    assert!(matches!(repo.get(" ").await, Err(StoreError::BlankId)));
    assert_eq!(store.pending_faults(), 1);
}

#[tokio::test]
async fn paged_ordered_finds_slice_the_sorted_result() {
    let (_, repo) = players();
    seed(&repo).await;

    let by_age = Ordering::by("age").ascending();
    let first_page = repo
        .find_all_ordered(by_age.clone(), Page::first(2))
        .await
        .unwrap();
    let second_page = repo.find_all_ordered(by_age, Page::new(1, 2)).await.unwrap();

    let ages = |list: &[Player]| list.iter().map(|p| p.age).collect::<Vec<_>>();
    assert_eq!(ages(&first_page), vec![22, 28]);
    assert_eq!(ages(&second_page), vec![35]);
}

#[tokio::test]
async fn last_equals_first_under_the_reversed_ordering() {
    let (_, repo) = players();
    seed(&repo).await;

    let order = Ordering::by("age").ascending();
    let last = repo
        .last_ordered(Predicate::all(), order.clone())
        .await
        .unwrap()
        .unwrap();
    let first_reversed = repo
        .first_ordered(Predicate::all(), order.reverse())
        .await
        .unwrap()
        .unwrap();
    assert!(same_entity(&last, &first_reversed));
    assert_eq!(last.name, "Bruno");
}

#[tokio::test]
async fn transient_failures_recover_and_exhaust_like_the_blocking_facade() {
    let (store, repo) = players();
    seed(&repo).await;

    store.fail_next(StoreError::connection(IoError::new(
        ErrorKind::ConnectionReset,
        "reset",
    )));
    store.fail_next(StoreError::connection(IoError::new(
        ErrorKind::ConnectionReset,
        "reset",
    )));
    assert_eq!(repo.find_all().await.unwrap().len(), 3);

    for _ in 0..3 {
        store.fail_next(StoreError::connection(IoError::new(
            ErrorKind::ConnectionReset,
            "reset",
        )));
    }
    assert!(repo.find_all().await.unwrap_err().is_transient());
    assert_eq!(store.pending_faults(), 0);
}

#[tokio::test]
async fn delete_is_terminal() {
    let (_, repo) = players();
    let mut carlos = Player::new("Carlos", 30);
    repo.insert(&mut carlos).await.unwrap();

    repo.delete_entity(&carlos).await.unwrap();
    assert!(repo.get(carlos.id()).await.unwrap().is_none());
    repo.delete(carlos.id()).await.unwrap();
}

#[tokio::test]
async fn replace_many_awaits_each_write_in_order() {
    let (_, repo) = players();
    let mut squad = seed(&repo).await;

    for (offset, player) in squad.iter_mut().enumerate() {
        player.age += offset as i64 + 1;
    }
    repo.replace_many(&squad).await.unwrap();

    let ages: Vec<i64> = repo
        .find_all_ordered(Ordering::by("age").ascending(), Page::first(10))
        .await
        .unwrap()
        .iter()
        .map(|p| p.age)
        .collect();
    assert_eq!(ages, vec![23, 31, 37]);
}

#[tokio::test]
async fn any_and_update_where_round_trip() {
    let (_, repo) = players();
    seed(&repo).await;

    assert!(repo.any(Predicate::field("age").gt(30)).await.unwrap());
    assert!(repo
        .update_field_where(Predicate::field("age").gt(30), "age", 30)
        .await
        .unwrap());
    assert!(!repo.any(Predicate::field("age").gt(30)).await.unwrap());
}
