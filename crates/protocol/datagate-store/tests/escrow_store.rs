//! Integration tests for the SQLite escrow store.

use std::collections::HashSet;

use datagate_store::{
    database_path, EscrowStore, NewAccessRequest, PageRequest, SqliteEscrowStore,
};
use datagate_types::{Address, RequestKey, RequestStatus};
use tempfile::TempDir;

fn request(owner: &str, requester: &str, dataset: &str, created_at: u64) -> NewAccessRequest {
    NewAccessRequest {
        key: RequestKey::parse(owner, requester, dataset).unwrap(),
        message: None,
        price: 10,
        created_at,
    }
}

#[test]
fn test_records_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = database_path(temp_dir.path().join("nested"));

    let id = {
        let store = SqliteEscrowStore::open(&path).unwrap();
        let created = store
            .insert_request(&request("0x1", "0x2", "d", 1_000))
            .unwrap();
        store.mark_approved(created.id, created.version, 1_100).unwrap();
        created.id
    };

    let store = SqliteEscrowStore::open(&path).unwrap();
    let reloaded = store.get_request(id).unwrap().unwrap();
    assert_eq!(reloaded.status, RequestStatus::Approved);
    assert_eq!(reloaded.approved_at, Some(1_100));
    assert_eq!(reloaded.version, 2);
}

#[test]
fn test_owner_listing_pages_newest_first() {
    let store = SqliteEscrowStore::open_in_memory().unwrap();
    let owner = Address::parse("0xaa").unwrap();

    // Two share a timestamp so the id tie-break is exercised
    let times = [1_000, 2_000, 2_000, 3_000, 4_000];
    for (i, ts) in times.iter().enumerate() {
        store
            .insert_request(&request("0xaa", "0xbb", &format!("set-{}", i), *ts))
            .unwrap();
    }
    // Someone else's dataset
    store
        .insert_request(&request("0xcc", "0xbb", "other", 5_000))
        .unwrap();

    let first = store
        .list_for_owner(&owner, &PageRequest::first(2))
        .unwrap();
    assert_eq!(first.requests.len(), 2);
    assert_eq!(first.requests[0].created_at, Some(4_000));
    assert_eq!(first.requests[1].created_at, Some(3_000));
    let cursor = first.next_cursor.unwrap();

    let second = store
        .list_for_owner(&owner, &PageRequest::after(cursor, 2))
        .unwrap();
    assert_eq!(second.requests.len(), 2);
    assert_eq!(second.requests[0].created_at, Some(2_000));
    assert_eq!(second.requests[1].created_at, Some(2_000));
    assert!(second.requests[0].id > second.requests[1].id);

    let third = store
        .list_for_owner(&owner, &PageRequest::after(second.next_cursor.unwrap(), 2))
        .unwrap();
    assert_eq!(third.requests.len(), 1);
    assert!(third.next_cursor.is_none());

    let seen: HashSet<i64> = first
        .requests
        .iter()
        .chain(&second.requests)
        .chain(&third.requests)
        .map(|r| r.id)
        .collect();
    assert_eq!(seen.len(), times.len());
}

#[test]
fn test_requester_listing() {
    let store = SqliteEscrowStore::open_in_memory().unwrap();
    store
        .insert_request(&request("0x1", "0xbb", "a", 1_000))
        .unwrap();
    store
        .insert_request(&request("0x2", "0xbb", "b", 2_000))
        .unwrap();
    store
        .insert_request(&request("0x2", "0xcc", "b", 3_000))
        .unwrap();

    let page = store
        .list_for_requester(&Address::parse("0xBB").unwrap(), &PageRequest::default())
        .unwrap();
    assert_eq!(page.requests.len(), 2);
    assert!(page.next_cursor.is_none());
    assert!(page
        .requests
        .iter()
        .all(|r| r.requester.as_str() == "0xbb"));
}

#[test]
fn test_exact_page_has_no_cursor() {
    let store = SqliteEscrowStore::open_in_memory().unwrap();
    for i in 0..3 {
        store
            .insert_request(&request("0x1", "0x2", &format!("d{}", i), 1_000 + i))
            .unwrap();
    }

    let page = store
        .list_for_owner(&Address::parse("0x1").unwrap(), &PageRequest::first(3))
        .unwrap();
    assert_eq!(page.requests.len(), 3);
    assert!(page.next_cursor.is_none());
}
