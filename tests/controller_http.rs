//! List controller driving the HTTP page service against the fake backend.

use std::sync::{Arc, Mutex};

use che_dash::api::{ApiClient, Collection, RemotePageService};
use che_dash::backend::{FakeBackend, spawn_local};
use che_dash::errors::ListError;
use che_dash::list::{
    AutoConfirm, DeleteSummary, FACTORY_LABELS, ListController, LoadOutcome, Notifier, PageKey,
    PageService, PageWindow, WORKSPACE_LABELS,
};
use che_dash::mock::mock_factories;
use che_dash::models::{Factory, Workspace};
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
struct Recorder {
    errors: Arc<Mutex<Vec<String>>>,
    infos: Arc<Mutex<Vec<String>>>,
}

impl Notifier for Recorder {
    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn show_info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }
}

type Factories = ListController<RemotePageService<Factory>, Recorder, AutoConfirm>;

async fn serve(backend: FakeBackend) -> (ApiClient, JoinHandle<()>) {
    let (addr, handle) = spawn_local(backend).await.unwrap();
    (ApiClient::new(format!("http://{}", addr)).unwrap(), handle)
}

fn factories_backend(count: usize, links: bool) -> FakeBackend {
    let mut backend = FakeBackend::demo(0);
    for factory in mock_factories(count, "user1") {
        backend.add_user_factory(factory);
    }
    backend.with_link_headers(links);
    backend
}

async fn factories_controller(
    client: ApiClient,
    page_size: u32,
    confirm: bool,
) -> (Factories, Recorder) {
    let service = RemotePageService::factories(client).await.unwrap();
    let recorder = Recorder::default();
    let controller = ListController::new(
        service,
        recorder.clone(),
        AutoConfirm(confirm),
        FACTORY_LABELS,
        PageWindow::first(page_size).unwrap(),
    );
    (controller, recorder)
}

fn ids(items: &[Factory]) -> Vec<String> {
    items.iter().map(|f| f.id.clone()).collect()
}

#[tokio::test]
async fn test_link_header_pagination() {
    let (client, handle) = serve(factories_backend(12, true)).await;
    let (controller, recorder) = factories_controller(client, 5, true).await;

    assert_eq!(controller.load_initial().await, LoadOutcome::Loaded);
    assert_eq!(controller.visible_items().len(), 5);
    assert!(controller.is_pagination());
    assert!(controller.has_next_page());
    assert!(controller.has_last_page());
    assert!(!controller.has_previous_page());

    assert_eq!(controller.fetch_page_by_key(PageKey::Last).await, LoadOutcome::Loaded);
    assert_eq!(
        ids(&controller.visible_items()),
        vec!["factoryId10".to_string(), "factoryId11".to_string()]
    );
    assert!(controller.has_previous_page());
    assert!(!controller.has_next_page());
    assert!(!controller.has_last_page());
    assert!(recorder.errors.lock().unwrap().is_empty());
    handle.abort();
}

#[tokio::test]
async fn test_link_mode_stops_at_last_page() {
    let (client, handle) = serve(factories_backend(10, true)).await;
    let (controller, recorder) = factories_controller(client, 5, true).await;

    controller.load_initial().await;
    assert_eq!(controller.fetch_page_by_key(PageKey::Next).await, LoadOutcome::Loaded);
    assert_eq!(
        ids(&controller.visible_items()),
        (5..10).map(|i| format!("factoryId{}", i)).collect::<Vec<_>>()
    );
    assert!(!controller.has_next_page());

    // The last page is full, but the server sent no next link.
    assert_eq!(controller.fetch_page_by_key(PageKey::Next).await, LoadOutcome::Failed);
    assert_eq!(controller.visible_items().len(), 5);
    let info = controller.service().pages_info();
    assert_eq!(info.current_page_number, Some(2));
    assert_eq!(info.count_of_pages, Some(2));
    assert_eq!(recorder.errors.lock().unwrap().as_slice(), ["Update information failed."]);
    handle.abort();
}

#[tokio::test]
async fn test_synthesized_pages_without_link_header() {
    let (client, handle) = serve(factories_backend(7, false)).await;
    let (controller, recorder) = factories_controller(client, 5, true).await;

    controller.load_initial().await;
    assert!(controller.has_next_page());
    assert!(!controller.has_last_page());

    assert_eq!(controller.fetch_page_by_key(PageKey::Next).await, LoadOutcome::Loaded);
    assert_eq!(controller.visible_items().len(), 2);
    assert!(!controller.has_next_page());
    assert!(controller.has_previous_page());

    // No page count is known, so there is no last page to go to.
    assert_eq!(controller.fetch_page_by_key(PageKey::Last).await, LoadOutcome::Failed);
    assert_eq!(recorder.errors.lock().unwrap().as_slice(), ["Update information failed."]);
    handle.abort();
}

#[tokio::test]
async fn test_unchanged_page_is_not_modified() {
    let (client, handle) = serve(factories_backend(3, false)).await;
    let (controller, recorder) = factories_controller(client, 5, true).await;

    assert_eq!(controller.load_initial().await, LoadOutcome::Loaded);
    assert_eq!(controller.reload().await, LoadOutcome::NotModified);
    assert_eq!(controller.visible_items().len(), 3);
    assert!(!controller.is_loading());
    assert!(recorder.errors.lock().unwrap().is_empty());
    handle.abort();
}

#[tokio::test]
async fn test_bulk_delete_refreshes_page() {
    let (client, handle) = serve(factories_backend(4, false)).await;
    let (controller, recorder) = factories_controller(client, 5, true).await;

    controller.load_initial().await;
    controller.set_selected("factoryId0", true);
    controller.set_selected("factoryId2", true);

    let summary = controller.delete_selected().await.unwrap();
    assert_eq!(summary, DeleteSummary::Deleted { count: 2 });
    assert_eq!(
        ids(&controller.visible_items()),
        vec!["factoryId1".to_string(), "factoryId3".to_string()]
    );
    assert_eq!(recorder.infos.lock().unwrap().as_slice(), ["2 factories has been removed."]);
    assert!(controller.selected_ids().is_empty());
    handle.abort();
}

#[tokio::test]
async fn test_bulk_delete_with_failure() {
    let mut backend = factories_backend(3, false);
    backend.fail_delete_of("factoryId1");
    let (client, handle) = serve(backend).await;
    let (controller, recorder) = factories_controller(client, 5, true).await;

    controller.load_initial().await;
    controller.select_all_visible();
    let err = controller.delete_selected().await.unwrap_err();
    assert!(matches!(err, ListError::PartialDeleteFailure { failed: 1, total: 3 }));

    assert_eq!(ids(&controller.visible_items()), vec!["factoryId1".to_string()]);
    assert_eq!(recorder.errors.lock().unwrap().as_slice(), ["Delete failed."]);
    assert!(recorder.infos.lock().unwrap().is_empty());
    handle.abort();
}

#[tokio::test]
async fn test_declined_delete_keeps_everything() {
    let (client, handle) = serve(factories_backend(2, false)).await;
    let (controller, _recorder) = factories_controller(client, 5, false).await;

    controller.load_initial().await;
    controller.select_all_visible();
    assert_eq!(controller.delete_selected().await.unwrap(), DeleteSummary::Cancelled);
    assert_eq!(controller.selected_ids().len(), 2);

    controller.reload().await;
    assert_eq!(controller.visible_items().len(), 2);
    handle.abort();
}

#[tokio::test]
async fn test_workspaces_collection() {
    let (client, handle) = serve(FakeBackend::demo(0)).await;
    let recorder = Recorder::default();
    let controller = ListController::new(
        RemotePageService::<Workspace>::new(client, Collection::workspaces()),
        recorder.clone(),
        AutoConfirm(true),
        WORKSPACE_LABELS,
        PageWindow::first(10).unwrap(),
    );

    assert_eq!(controller.load_initial().await, LoadOutcome::Loaded);
    assert_eq!(controller.visible_items().len(), 10);
    controller.search("workspaceName1");
    // workspaceName10 and up are not on the first page
    assert_eq!(controller.visible_items().len(), 1);

    controller.search("");
    controller.set_selected("workspaceId3", true);
    assert_eq!(
        controller.delete_selected().await.unwrap(),
        DeleteSummary::Deleted { count: 1 }
    );
    assert_eq!(recorder.infos.lock().unwrap().as_slice(), ["1 workspace has been removed."]);
    assert!(controller.visible_items().iter().all(|w| w.id != "workspaceId3"));
    handle.abort();
}

#[tokio::test]
async fn test_server_message_is_shown_on_failure() {
    let (client, handle) = serve(FakeBackend::new()).await;
    let recorder = Recorder::default();
    // No creator query: the fake server answers 400 with a message body.
    let collection = Collection {
        list_path: "/api/factory/find".to_string(),
        item_path: "/api/factory".to_string(),
        query: Vec::new(),
    };
    let controller = ListController::new(
        RemotePageService::<Factory>::new(client, collection),
        recorder.clone(),
        AutoConfirm(true),
        FACTORY_LABELS,
        PageWindow::first(5).unwrap(),
    );

    assert_eq!(controller.load_initial().await, LoadOutcome::Failed);
    assert_eq!(
        recorder.errors.lock().unwrap().as_slice(),
        ["Query parameter 'creator.userId' is required"]
    );
    handle.abort();
}
