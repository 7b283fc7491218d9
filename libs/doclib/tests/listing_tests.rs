use doclib::io::network::ApiError;
use doclib::model::path_ops::Breadcrumb;
use doclib::service::events::Event;
use doclib::{Classification, DocErrKind, DocLibrary};
use http::Method;
use serde_json::json;
use test_utils::*;

#[tokio::test]
async fn folders_come_first_then_names() {
    let service = MockService::new();
    service
        .add_folder("alpha")
        .add_folder("Zeta")
        .add_file("b.pdf", Classification::Public)
        .add_file("A.txt", Classification::Public);
    let lib = test_lib(&service).await;

    lib.refresh().await.unwrap();

    assert_eq!(listed_paths(&lib), vec!["Zeta", "alpha", "A.txt", "b.pdf"]);
    let state = lib.state();
    assert!(state.documents[0].is_folder && state.documents[1].is_folder);
    assert_eq!(state.documents[2].classification, Some(Classification::Public));
    assert_eq!(state.documents[0].classification, None);
    assert!(!state.is_refreshing);
}

#[tokio::test]
async fn navigation_clears_selection_and_rebuilds_crumbs() {
    let service = MockService::new();
    service
        .add_file("x.txt", Classification::Public)
        .add_file("A/B/C/y.txt", Classification::Public);
    let lib = test_lib(&service).await;
    lib.refresh().await.unwrap();

    lib.toggle_select("x.txt");
    assert_eq!(lib.selected().len(), 1);

    lib.navigate_to("A/B/C").await.unwrap();
    let state = lib.state();
    assert!(state.selection.is_empty());
    assert_eq!(state.current_path, "A/B/C");
    assert_eq!(
        state.breadcrumbs,
        vec![
            Breadcrumb { name: "Root".to_string(), path: "".to_string() },
            Breadcrumb { name: "A".to_string(), path: "A".to_string() },
            Breadcrumb { name: "B".to_string(), path: "A/B".to_string() },
            Breadcrumb { name: "C".to_string(), path: "A/B/C".to_string() },
        ]
    );
    assert_eq!(listed_paths(&lib), vec!["A/B/C/y.txt"]);
    assert!(!state.is_loading);

    lib.navigate_to_breadcrumb(9).await.unwrap();
    assert_eq!(lib.state().current_path, "A/B/C");

    lib.open_entry(&listed(&lib, "A/B/C/y.txt")).await.unwrap();
    assert_eq!(lib.state().current_path, "A/B/C");

    lib.navigate_to_breadcrumb(1).await.unwrap();
    assert_eq!(lib.state().current_path, "A");
    assert_eq!(listed_paths(&lib), vec!["A/B"]);

    lib.open_entry(&listed(&lib, "A/B")).await.unwrap();
    assert_eq!(lib.state().current_path, "A/B");

    lib.navigate_up().await.unwrap();
    lib.navigate_up().await.unwrap();
    assert_eq!(lib.state().current_path, "");
    assert_eq!(lib.state().breadcrumbs.len(), 1);
}

#[tokio::test]
async fn cannot_go_above_root() {
    let service = MockService::new();
    let lib = test_lib(&service).await;

    let err = lib.navigate_up().await.unwrap_err();
    assert_eq!(err.kind, DocErrKind::AlreadyAtRoot);
    assert_eq!(lib.state().error, None);
    assert_eq!(service.listings(), 0);
}

#[tokio::test]
async fn selection_only_holds_listed_paths() {
    let service = MockService::new();
    service
        .add_file("a.txt", Classification::Public)
        .add_file("b.txt", Classification::Public);
    let lib = test_lib(&service).await;
    lib.refresh().await.unwrap();

    lib.toggle_select("ghost.txt");
    assert!(lib.selected().is_empty());

    lib.select_all();
    assert_eq!(lib.selected().len(), 2);
    lib.toggle_select("a.txt");
    assert_eq!(lib.selected().len(), 1);
    lib.clear_selection();
    assert!(lib.selected().is_empty());
}

#[tokio::test]
async fn fetch_error_shows_the_service_detail() {
    let service = MockService::new();
    service.fail(
        Method::GET,
        "/files",
        ApiError::Status { status: 500, detail: Some("database down".to_string()) },
    );
    let lib = test_lib(&service).await;

    let err = lib.refresh().await.unwrap_err();
    assert_eq!(err.kind, DocErrKind::Fetch("database down".to_string()));

    let state = lib.state();
    assert_eq!(state.error.as_deref(), Some("Failed to fetch documents: database down"));
    assert!(!state.is_refreshing);
    assert!(!state.is_loading);

    lib.dismiss_error();
    assert_eq!(lib.state().error, None);
}

#[tokio::test]
async fn unreachable_service() {
    let service = MockService::new();
    service.fail(Method::GET, "/files", ApiError::SendFailed("connection refused".to_string()));
    let lib = test_lib(&service).await;

    let err = lib.refresh().await.unwrap_err();
    assert_eq!(err.kind, DocErrKind::ServerUnreachable);
    assert_eq!(lib.state().error.as_deref(), Some("Could not reach the document service"));
}

#[tokio::test]
async fn listing_that_is_not_a_list() {
    let service = MockService::new();
    service.raw_listing("", json!({ "files": [] }));
    let lib = test_lib(&service).await;

    let err = lib.refresh().await.unwrap_err();
    assert!(matches!(err.kind, DocErrKind::Fetch(_)));
    assert!(lib.state().documents.is_empty());
}

#[tokio::test]
async fn duplicate_paths_collapse() {
    let service = MockService::new();
    service.raw_listing(
        "",
        json!([
            { "name": "a.txt", "path": "a.txt", "type": "txt", "classification": "PUBLIC" },
            { "name": "a.txt", "path": "/a.txt", "type": "txt", "classification": "PUBLIC" },
            { "name": "b.txt", "path": "b.txt", "type": "txt" },
        ]),
    );
    let lib = test_lib(&service).await;
    lib.refresh().await.unwrap();

    assert_eq!(listed_paths(&lib), vec!["a.txt", "b.txt"]);
    assert_eq!(listed(&lib, "b.txt").classification, Some(Classification::Unset));
}

#[tokio::test]
async fn refresh_while_refreshing_is_dropped() {
    let service = MockService::new();
    service.add_file("a.txt", Classification::Public);
    let lib = test_lib(&service).await;

    service.hold_listings();
    let bg = lib.clone();
    let first = tokio::spawn(async move { bg.refresh().await });
    assert!(eventually(|| service.listings() == 1).await);
    assert!(lib.state().is_refreshing);

    lib.refresh().await.unwrap();
    assert_eq!(service.listings(), 1);

    service.release_listings();
    first.await.unwrap().unwrap();
    // the dropped refresh makes the owner fetch once more
    assert_eq!(service.listings(), 2);
    assert!(!lib.state().is_refreshing);
    assert_eq!(listed_paths(&lib), vec!["a.txt"]);
}

#[tokio::test]
async fn mutation_during_a_listing_is_refetched() {
    let service = MockService::new();
    service.add_file("a.txt", Classification::Public);
    let lib = test_lib(&service).await;
    lib.refresh().await.unwrap();

    service.hold_listings();
    let bg = lib.clone();
    let first = tokio::spawn(async move { bg.refresh().await });
    assert!(eventually(|| service.listings() == 2).await);

    let sent = lib.rename_entry(&listed(&lib, "a.txt"), "b").await.unwrap();
    assert_eq!(sent, "b.txt");
    assert!(service.exists("b.txt"));

    service.release_listings();
    first.await.unwrap().unwrap();

    assert_eq!(service.listings(), 3);
    assert_eq!(listed_paths(&lib), vec!["b.txt"]);
    assert!(!lib.state().is_refreshing);
}

#[tokio::test]
async fn listing_of_a_folder_left_behind_is_discarded() {
    let service = MockService::new();
    service
        .add_file("root.txt", Classification::Public)
        .add_file("A/inner.txt", Classification::Public);
    let lib = test_lib(&service).await;

    service.hold_listings();
    let bg = lib.clone();
    let first = tokio::spawn(async move { bg.refresh().await });
    assert!(eventually(|| service.listings() == 1).await);

    // the in-flight refresh owns the guard, so this one is dropped
    lib.navigate_to("A").await.unwrap();

    service.release_listings();
    first.await.unwrap().unwrap();

    assert_eq!(service.listings(), 2);
    assert_eq!(lib.state().current_path, "A");
    assert_eq!(listed_paths(&lib), vec!["A/inner.txt"]);
    assert!(!lib.state().is_loading);
}

#[tokio::test]
async fn background_observer_follows_navigation() {
    let service = MockService::new();
    service.add_file("A/inner.txt", Classification::Public);
    let mut config = test_config();
    config.background_work = true;
    let lib = DocLibrary::with_client(config, service.clone())
        .await
        .unwrap();
    let mut events = lib.subscribe();

    lib.navigate_to("A").await.unwrap();

    let mut saw_path_change = false;
    while let Ok(evt) = events.try_recv() {
        saw_path_change |= evt == Event::PathChanged("A".to_string());
    }
    assert!(saw_path_change);
    assert!(eventually(|| listed_paths(&lib) == vec!["A/inner.txt"]).await);
    assert!(eventually(|| !lib.state().is_loading).await);
}
