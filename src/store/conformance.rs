//! Behavior every store backend must share. Each check seeds its own users
//! and uses a random marker, so it also runs against a non-empty database.

use std::collections::HashSet;

use rand::Rng;
use rand::distr::Alphanumeric;
use time::{Duration, OffsetDateTime};

use super::{BoardStore, SessionStore, StoreError, UserStore};
use crate::model::{BoardPost, NewUser, PageRequest, SearchType, User, UserRole};

const PAGE: u32 = 0;
const SIZE: u32 = 10;

pub fn random_string() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

pub async fn seed_user<S: UserStore + ?Sized>(store: &S, role: UserRole) -> User {
    store
        .insert_user(NewUser { account_id: random_string(), password: random_string(), role })
        .await
        .expect("seed user should insert")
}

async fn save<S: BoardStore + ?Sized>(store: &S, title: &str, contents: &str, writer: &User) -> BoardPost {
    store
        .insert_post(&BoardPost::draft(title, contents, writer.clone()))
        .await
        .expect("post should insert")
}

fn ids(posts: &[BoardPost]) -> Vec<i64> {
    posts.iter().map(|p| p.id).collect()
}

fn unbounded() -> PageRequest {
    PageRequest::new(0, 10_000)
}

// =============================================================================
// USERS
// =============================================================================

pub async fn insert_user_assigns_id_and_rejects_duplicates<S: UserStore>(store: &S) {
    let account_id = random_string();
    let user = store
        .insert_user(NewUser { account_id: account_id.clone(), password: "password".into(), role: UserRole::Normal })
        .await
        .expect("first insert should succeed");
    assert_ne!(user.id, 0);
    assert_eq!(user.account_id, account_id);

    let dup = store
        .insert_user(NewUser { account_id: account_id.clone(), password: "other".into(), role: UserRole::Normal })
        .await;
    assert!(matches!(dup, Err(StoreError::Duplicate(_))));

    let found = store
        .find_user_by_account_id(&account_id)
        .await
        .unwrap()
        .expect("user should be found by account id");
    assert_eq!(found.id, user.id);
    assert_eq!(found.password, "password");

    let by_id = store.find_user_by_id(user.id).await.unwrap();
    assert_eq!(by_id.map(|u| u.account_id), Some(account_id));
}

pub async fn find_all_users_is_ascending_by_id<S: UserStore>(store: &S) {
    let a = seed_user(store, UserRole::Normal).await;
    let b = seed_user(store, UserRole::Admin).await;

    let all = store.find_all_users().await.unwrap();
    let all_ids = all.iter().map(|u| u.id).collect::<Vec<_>>();
    assert!(all_ids.windows(2).all(|w| w[0] < w[1]));
    assert!(all_ids.contains(&a.id));
    let admin = all.iter().find(|u| u.id == b.id).expect("admin listed");
    assert_eq!(admin.role, UserRole::Admin);
}

// =============================================================================
// POST CRUD
// =============================================================================

pub async fn insert_assigns_non_zero_id<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let draft = BoardPost::draft(random_string(), random_string(), writer);
    assert_eq!(draft.id, 0);

    let saved = store.insert_post(&draft).await.unwrap();
    assert_ne!(saved.id, 0);
    assert!(saved.is_saved());
}

pub async fn insert_rejects_unknown_writer<S: UserStore + BoardStore>(store: &S) {
    let mut ghost = seed_user(store, UserRole::Normal).await;
    ghost.id = i64::MAX;
    let result = store.insert_post(&BoardPost::draft("t", "c", ghost)).await;
    assert!(matches!(result, Err(StoreError::MissingReference(_))));
}

pub async fn find_by_id_resolves_fields_and_writer<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Admin).await;
    let saved = save(store, &random_string(), &random_string(), &writer).await;

    let found = store
        .find_post_by_id(saved.id)
        .await
        .unwrap()
        .expect("saved post should be found");
    assert_eq!(found.title, saved.title);
    assert_eq!(found.contents, saved.contents);
    assert_eq!(found.writer.id, writer.id);
    assert_eq!(found.writer.role, writer.role);
    assert_eq!(found.writer.account_id, writer.account_id);
}

pub async fn delete_makes_post_absent<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let saved = save(store, "title", "contents", &writer).await;
    assert!(store.find_post_by_id(saved.id).await.unwrap().is_some());

    assert!(store.delete_post_by_id(saved.id).await.unwrap());
    assert!(store.find_post_by_id(saved.id).await.unwrap().is_none());
    assert!(!store.delete_post_by_id(saved.id).await.unwrap(), "second delete finds nothing");
}

pub async fn update_replaces_title_and_contents_only<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let saved = save(store, "before", "before", &writer).await;
    let (title, contents) = (random_string(), random_string());

    assert!(store.update_post_by_id(saved.id, &title, &contents).await.unwrap());

    let updated = store.find_post_by_id(saved.id).await.unwrap().expect("still present");
    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.title, title);
    assert_eq!(updated.contents, contents);
    assert_eq!(updated.writer.id, writer.id);
}

pub async fn update_missing_id_reports_no_row<S: BoardStore>(store: &S) {
    assert!(!store.update_post_by_id(i64::MAX, "t", "c").await.unwrap());
}

// =============================================================================
// SEARCH + PAGING
// =============================================================================

pub async fn contents_search_pages_partition_results<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let marker = random_string();
    let mut saved = HashSet::new();
    for _ in 0..20 {
        saved.insert(save(store, "title", &marker, &writer).await.id);
    }

    let first = store
        .find_all_posts(SearchType::Contents, &marker, PageRequest::new(PAGE, SIZE))
        .await
        .unwrap();
    let second = store
        .find_all_posts(SearchType::Contents, &marker, PageRequest::new(PAGE + 1, SIZE))
        .await
        .unwrap();
    let third = store
        .find_all_posts(SearchType::Contents, &marker, PageRequest::new(PAGE + 2, SIZE))
        .await
        .unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);
    assert!(third.is_empty());

    let mut seen = HashSet::new();
    for id in ids(&first).into_iter().chain(ids(&second)) {
        assert!(saved.contains(&id), "result {id} was not saved by this test");
        assert!(seen.insert(id), "post {id} appeared on two pages");
    }
    assert_eq!(seen, saved);

    let again = store
        .find_all_posts(SearchType::Contents, &marker, PageRequest::new(PAGE, SIZE))
        .await
        .unwrap();
    assert_eq!(ids(&again), ids(&first), "repeated query must be stable");
}

pub async fn listings_are_newest_first<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let marker = random_string();
    for _ in 0..5 {
        save(store, &marker, "contents", &writer).await;
    }

    let found = store
        .find_all_posts(SearchType::Title, &marker, unbounded())
        .await
        .unwrap();
    let found_ids = ids(&found);
    assert_eq!(found_ids.len(), 5);
    assert!(found_ids.windows(2).all(|w| w[0] > w[1]));
}

pub async fn all_search_matches_title_or_contents<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let marker = random_string();
    let mut saved = HashSet::new();
    for i in 0..20 {
        let post = if i % 2 == 0 {
            save(store, "title", &marker, &writer).await
        } else {
            save(store, &marker, "contents", &writer).await
        };
        saved.insert(post.id);
    }

    let found = store
        .find_all_posts(SearchType::All, &marker, PageRequest::new(PAGE, SIZE))
        .await
        .unwrap();
    assert_eq!(found.len(), 10);
    assert!(found.iter().all(|p| saved.contains(&p.id)));

    let total = store.find_total_size_for_search(SearchType::All, &marker).await.unwrap();
    assert_eq!(total, 20);
}

pub async fn title_and_contents_search_are_field_specific<S: UserStore + BoardStore>(store: &S) {
    const IN_TITLE: usize = 7;
    let writer = seed_user(store, UserRole::Normal).await;
    let marker = random_string();
    for i in 0..20 {
        if i < IN_TITLE {
            save(store, &marker, "contents", &writer).await;
        } else {
            save(store, "title", &marker, &writer).await;
        }
    }

    let by_title = store
        .find_all_posts(SearchType::Title, &marker, PageRequest::new(PAGE, SIZE))
        .await
        .unwrap();
    assert_eq!(by_title.len(), IN_TITLE);
    assert!(by_title.iter().all(|p| p.title == marker));

    let by_contents = store
        .find_all_posts(SearchType::Contents, &marker, unbounded())
        .await
        .unwrap();
    assert_eq!(by_contents.len(), 20 - IN_TITLE);
    assert!(by_contents.iter().all(|p| p.contents == marker));

    assert_eq!(store.find_total_size_for_search(SearchType::Title, &marker).await.unwrap(), 7);
    assert_eq!(store.find_total_size_for_search(SearchType::Contents, &marker).await.unwrap(), 13);
}

pub async fn keyword_is_matched_literally<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let marker = random_string();
    save(store, &format!("{marker}_100%"), "contents", &writer).await;
    save(store, &format!("{marker}X100Y"), "contents", &writer).await;

    let keyword = format!("{marker}_100%");
    let found = store
        .find_all_posts(SearchType::Title, &keyword, unbounded())
        .await
        .unwrap();
    assert_eq!(found.len(), 1, "wildcard characters must not match arbitrary text");
    assert_eq!(store.find_total_size_for_search(SearchType::Title, &keyword).await.unwrap(), 1);
}

pub async fn count_agrees_with_unbounded_find_all<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let marker = random_string();
    save(store, &marker, "contents", &writer).await;
    save(store, "title", &marker, &writer).await;
    save(store, &marker, &marker, &writer).await;
    save(store, "title", "contents", &writer).await;

    for search_type in [SearchType::All, SearchType::Title, SearchType::Contents] {
        let listed = store.find_all_posts(search_type, &marker, unbounded()).await.unwrap();
        let total = store.find_total_size_for_search(search_type, &marker).await.unwrap();
        assert_eq!(total, i64::try_from(listed.len()).unwrap(), "{search_type:?}");
    }
    assert_eq!(store.find_total_size_for_search(SearchType::All, &marker).await.unwrap(), 3);
}

// =============================================================================
// WRITER FILTERS
// =============================================================================

pub async fn find_all_by_writer_in_filters_and_pages<S: UserStore + BoardStore>(store: &S) {
    let writers = vec![
        seed_user(store, UserRole::Normal).await,
        seed_user(store, UserRole::Normal).await,
        seed_user(store, UserRole::Normal).await,
    ];
    let outsider = seed_user(store, UserRole::Normal).await;
    save(store, "title", "contents", &outsider).await;

    let mut saved = HashSet::new();
    for i in 0..20 {
        saved.insert(save(store, "title", "contents", &writers[i % writers.len()]).await.id);
    }

    let found = store
        .find_all_posts_by_writer_in(&writers, PageRequest::new(PAGE, SIZE))
        .await
        .unwrap();
    assert_eq!(found.len(), 10);
    let writer_ids = writers.iter().map(|w| w.id).collect::<HashSet<_>>();
    for post in &found {
        assert!(saved.contains(&post.id));
        assert!(writer_ids.contains(&post.writer.id));
    }

    let everything = store
        .find_all_posts_by_writer_in(&writers, unbounded())
        .await
        .unwrap();
    assert_eq!(everything.len(), 20);

    let none = store.find_all_posts_by_writer_in(&[], unbounded()).await.unwrap();
    assert!(none.is_empty());
}

pub async fn find_all_by_writer_id_pages_one_writer<S: UserStore + BoardStore>(store: &S) {
    let writer = seed_user(store, UserRole::Normal).await;
    let other = seed_user(store, UserRole::Normal).await;
    save(store, "title", "contents", &other).await;

    let mut saved = HashSet::new();
    for _ in 0..SIZE {
        saved.insert(save(store, "title", "contents", &writer).await.id);
    }

    let found = store
        .find_all_posts_by_writer_id(writer.id, PageRequest::new(PAGE, SIZE))
        .await
        .unwrap();
    assert_eq!(found.len(), 10);
    assert!(found.iter().all(|p| saved.contains(&p.id) && p.writer.id == writer.id));

    let sizes = [0, 1, 2].map(|page| PageRequest::new(page, 4));
    let mut lens = Vec::new();
    for page in sizes {
        lens.push(store.find_all_posts_by_writer_id(writer.id, page).await.unwrap().len());
    }
    assert_eq!(lens, vec![4, 4, 2]);
}

// =============================================================================
// SESSIONS
// =============================================================================

pub async fn sessions_resolve_until_expiry_or_delete<S: UserStore + SessionStore>(store: &S) {
    let user = seed_user(store, UserRole::Normal).await;
    let token = random_string();
    let now = OffsetDateTime::now_utc();

    store
        .insert_session(&token, user.id, now + Duration::minutes(30))
        .await
        .unwrap();

    let resolved = store.find_session_user(&token, now).await.unwrap();
    assert_eq!(resolved.map(|u| u.id), Some(user.id));

    let expired = store
        .find_session_user(&token, now + Duration::minutes(31))
        .await
        .unwrap();
    assert!(expired.is_none());

    store.delete_session(&token).await.unwrap();
    assert!(store.find_session_user(&token, now).await.unwrap().is_none());
    assert!(store.find_session_user("missing", now).await.unwrap().is_none());
}

pub async fn insert_session_purges_expired_sessions<S: UserStore + SessionStore>(store: &S) {
    let user = seed_user(store, UserRole::Normal).await;
    let now = OffsetDateTime::now_utc();
    let stale = random_string();
    let fresh = random_string();

    store
        .insert_session(&stale, user.id, now - Duration::minutes(1))
        .await
        .unwrap();
    store
        .insert_session(&fresh, user.id, now + Duration::minutes(30))
        .await
        .unwrap();

    // Looking up before the stale expiry only misses if the row is gone.
    let before_expiry = now - Duration::minutes(2);
    assert!(store.find_session_user(&stale, before_expiry).await.unwrap().is_none());
    assert_eq!(
        store.find_session_user(&fresh, now).await.unwrap().map(|u| u.id),
        Some(user.id)
    );
}
