mod common;

use std::sync::Arc;

use anyhow::Result;

use authadmin::routes::{Notice, RouteConsole, RouteId};
use common::{numbered_routes, route, TestServer};

async fn console_for(server: &TestServer, page_size: usize) -> Result<RouteConsole> {
    let mut console = RouteConsole::new(Arc::new(server.http_store()?), page_size);
    console.refresh().await?;
    Ok(console)
}

#[tokio::test]
async fn import_creates_unique_rows_and_holds_duplicates() -> Result<()> {
    let server = TestServer::spawn(vec![route("1", "alpha", false), route("2", "beta", false)]).await?;
    let mut console = console_for(&server, 10).await?;

    let csv = "id,name,created,protected\n\
               ,gamma,,true\n\
               9,alpha,2025-03-01T00:00:00Z,true\n";
    let notice = console.import_csv(csv).await;

    assert_eq!(notice, Notice::ImportPartial { unique: 1, duplicates: 1 });
    assert_eq!(server.store.len().await, 3);
    assert!(console.authoritative().iter().any(|r| r.name == "gamma" && r.protected));
    assert!(console.pending_duplicates().is_some());

    // a second import waits for the decision
    let blocked = console.import_csv("id,name,created\n,delta,\n").await;
    assert!(blocked.is_failure());
    assert_eq!(server.store.len().await, 3);

    let replaced = console.replace_duplicates().await;
    assert_eq!(replaced, Notice::CommitSucceeded { count: 1 });
    assert!(console.pending_duplicates().is_none());

    let stored = server.store.snapshot().await;
    let alpha = stored.iter().find(|r| r.name == "alpha").expect("alpha kept");
    assert_eq!(alpha.id, RouteId::new("1"));
    assert!(alpha.protected);
    assert_eq!(alpha.created, "2025-03-01T00:00:00Z");
    Ok(())
}

#[tokio::test]
async fn skipped_duplicates_leave_existing_routes_untouched() -> Result<()> {
    let server = TestServer::spawn(vec![route("1", "alpha", false)]).await?;
    let mut console = console_for(&server, 10).await?;

    let notice = console.import_csv("id,name,created\n5,alpha,2030-01-01\n").await;
    assert_eq!(notice, Notice::ImportPartial { unique: 0, duplicates: 1 });

    let skipped = console.skip_duplicates();
    assert!(!skipped.is_failure());
    assert_eq!(server.store.snapshot().await, vec![route("1", "alpha", false)]);
    Ok(())
}

#[tokio::test]
async fn malformed_csv_reaches_no_server() -> Result<()> {
    let server = TestServer::spawn(vec![route("1", "alpha", false)]).await?;
    let mut console = console_for(&server, 10).await?;

    let notice = console.import_csv("id,name\n1,alpha\n").await;
    assert_eq!(
        notice,
        Notice::ValidationFailed {
            reason: "Missing required column: created".to_string()
        }
    );
    assert_eq!(server.store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn staged_protection_is_submitted_as_one_batch() -> Result<()> {
    let server = TestServer::spawn(numbered_routes(7)).await?;
    let mut console = console_for(&server, 5).await?;

    console.set_search("ROUTE-1");
    assert_eq!(console.filtered_count(), 1);
    assert_eq!(console.toggle_all_filtered()?, 1);

    console.set_search("");
    console.toggle_protected(&RouteId::new("7"))?;
    assert_eq!(console.staged().len(), 2);
    assert_eq!(console.page_count(), 2);

    // nothing leaves the console until submit
    assert!(server.store.snapshot().await.iter().all(|r| !r.protected));

    let notice = console.submit_changes().await;
    assert_eq!(notice, Notice::CommitSucceeded { count: 2 });
    assert!(console.staged().is_empty());

    let protected: Vec<String> = server
        .store
        .snapshot()
        .await
        .into_iter()
        .filter(|r| r.protected)
        .map(|r| r.id.to_string())
        .collect();
    assert_eq!(protected, ["1", "7"]);
    Ok(())
}

#[tokio::test]
async fn delete_removes_routes_and_their_staged_edits() -> Result<()> {
    let server = TestServer::spawn(numbered_routes(3)).await?;
    let mut console = console_for(&server, 10).await?;

    console.toggle_protected(&RouteId::new("2"))?;
    let notice = console.delete(&[RouteId::new("2"), RouteId::new("3")]).await;

    assert_eq!(notice, Notice::CommitSucceeded { count: 2 });
    assert!(console.staged().is_empty());
    assert_eq!(console.authoritative().len(), 1);
    assert_eq!(server.store.len().await, 1);
    Ok(())
}
