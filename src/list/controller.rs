//! Paginated, filterable, multi-select list backed by a remote collection.
//!
//! Every load goes through the same cycle:
//!
//! ```text
//! Idle ─> Loading ─┬─> Loaded ──────┐
//!                  ├─> NotModified ─┼─> helper refreshed from the service page
//!                  └─> Failed ──────┘
//! ```
//!
//! Each fetch takes a sequence number; a response that is not the latest
//! issued is dropped without touching the loading flag, the notifier or the
//! helper.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::helper::{ListHelper, NameFilter};
use super::labels::{DELETE_FAILED, EntityLabels, UPDATE_FAILED};
use super::pagination::{PageWindow, PaginationInfo};
use super::service::{Confirmer, Notifier, PageKey, PageService};
use crate::errors::{ApiError, ListError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    NotModified,
    Failed,
}

/// Result of one load cycle as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    NotModified,
    Failed,
    /// A newer request was issued while this one was in flight.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSummary {
    /// The confirmation was declined or dismissed.
    Cancelled,
    Deleted { count: usize },
}

struct ViewState<T: crate::models::Entity> {
    skip_count: u32,
    is_loading: bool,
    phase: LoadPhase,
    helper: ListHelper<T>,
}

pub struct ListController<S: PageService, N: Notifier, C: Confirmer> {
    service: S,
    notifier: N,
    confirmer: C,
    labels: EntityLabels,
    max_items: u32,
    latest_request: AtomicU64,
    state: Mutex<ViewState<S::Item>>,
}

impl<S: PageService, N: Notifier, C: Confirmer> ListController<S, N, C> {
    pub fn new(service: S, notifier: N, confirmer: C, labels: EntityLabels, window: PageWindow) -> Self {
        Self {
            service,
            notifier,
            confirmer,
            labels,
            max_items: window.max_items(),
            latest_request: AtomicU64::new(0),
            state: Mutex::new(ViewState {
                skip_count: window.skip_count(),
                is_loading: false,
                phase: LoadPhase::Idle,
                helper: ListHelper::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState<S::Item>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn labels(&self) -> EntityLabels {
        self.labels
    }

    pub fn max_items(&self) -> u32 {
        self.max_items
    }

    pub fn skip_count(&self) -> u32 {
        self.state().skip_count
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn load_phase(&self) -> LoadPhase {
        self.state().phase
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Load the first page of `max_items` entities.
    pub async fn load_initial(&self) -> LoadOutcome {
        let seq = self.begin_load();
        self.state().skip_count = 0;
        info!(max_items = self.max_items, "Loading {}", self.labels.plural);
        let result = self.service.fetch_page(self.max_items, 0).await;
        self.finish_load(seq, result, self.labels.list_failure)
    }

    /// Load the page behind a navigation key. The page window is left as is.
    pub async fn fetch_page_by_key(&self, key: PageKey) -> LoadOutcome {
        let seq = self.begin_load();
        debug!(%key, "Fetching {} page", self.labels.plural);
        let result = self.service.fetch_page_by_key(key).await;
        self.finish_load(seq, result, UPDATE_FAILED)
    }

    /// Re-fetch the current page window.
    pub async fn reload(&self) -> LoadOutcome {
        let seq = self.begin_load();
        let skip = self.skip_count();
        let result = self.service.fetch_page(self.max_items, skip).await;
        self.finish_load(seq, result, UPDATE_FAILED)
    }

    fn begin_load(&self) -> u64 {
        let seq = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state();
        state.is_loading = true;
        state.phase = LoadPhase::Loading;
        seq
    }

    fn finish_load(&self, seq: u64, result: Result<(), ApiError>, fallback: &str) -> LoadOutcome {
        if self.latest_request.load(Ordering::SeqCst) != seq {
            debug!(seq, "Discarding stale {} response", self.labels.singular);
            return LoadOutcome::Stale;
        }

        let (outcome, phase, message) = match result {
            Ok(()) => (LoadOutcome::Loaded, LoadPhase::Loaded, None),
            Err(e) if e.is_not_modified() => {
                debug!("{} page not modified", self.labels.plural);
                (LoadOutcome::NotModified, LoadPhase::NotModified, None)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load {}", self.labels.plural);
                let message = e.server_message().unwrap_or(fallback).to_string();
                (LoadOutcome::Failed, LoadPhase::Failed, Some(message))
            }
        };

        let items = self.service.page_items();
        {
            let mut state = self.state();
            state.is_loading = false;
            state.phase = phase;
            state.helper.set_list(items);
        }

        if let Some(message) = message {
            self.notifier.show_error(&message);
        }
        outcome
    }

    // ── Filtering and selection ──────────────────────────────────────────

    /// Filter the loaded page by name. No request is issued.
    pub fn search(&self, text: &str) {
        self.state().helper.apply_filter(NameFilter::new(text));
    }

    pub fn filter(&self) -> NameFilter {
        self.state().helper.filter().clone()
    }

    pub fn visible_items(&self) -> Vec<S::Item> {
        self.state().helper.visible().into_iter().cloned().collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.state().helper.is_selected(id)
    }

    pub fn set_selected(&self, id: &str, selected: bool) -> bool {
        self.state().helper.set_selected(id, selected)
    }

    pub fn toggle_selection(&self, id: &str) -> bool {
        self.state().helper.toggle_selection(id)
    }

    pub fn select_all_visible(&self) {
        self.state().helper.select_all_visible();
    }

    pub fn deselect_all(&self) {
        self.state().helper.deselect_all();
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.state().helper.selected_ids()
    }

    // ── Pagination ───────────────────────────────────────────────────────

    pub fn pagination(&self) -> PaginationInfo {
        let page_len = self.service.page_items().len();
        PaginationInfo::from_pages_info(&self.service.pages_info(), page_len, self.max_items)
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination().has_next_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.pagination().has_previous_page()
    }

    pub fn has_last_page(&self) -> bool {
        self.pagination().has_last_page()
    }

    pub fn is_pagination(&self) -> bool {
        self.pagination().is_paginated()
    }

    // ── Bulk delete ──────────────────────────────────────────────────────

    /// Delete every selected entity after confirmation, then refresh the page.
    ///
    /// Deletes run concurrently; a failing one never stops the others. The
    /// page is re-fetched once all of them have settled, whatever their
    /// outcome.
    pub async fn delete_selected(&self) -> Result<DeleteSummary, ListError> {
        let ids = self.selected_ids();
        let total = ids.len();
        if total == 0 {
            let err = ListError::EmptySelection {
                noun: self.labels.singular,
            };
            self.notifier.show_error(&err.to_string());
            return Err(err);
        }

        if !self.confirmer.confirm(&self.labels.delete_prompt(total)).await {
            debug!(total, "Delete of {} cancelled", self.labels.plural);
            return Ok(DeleteSummary::Cancelled);
        }

        let mut pending = Vec::with_capacity(total);
        for id in &ids {
            self.state().helper.set_selected(id, false);
            pending.push(self.delete_one(id));
        }
        let failed = join_all(pending).await.into_iter().filter(|ok| !ok).count();

        let seq = self.begin_load();
        let skip = self.skip_count();
        let refresh = self.service.fetch_page(self.max_items, skip);

        if failed > 0 {
            self.notifier.show_error(DELETE_FAILED);
        } else {
            self.notifier.show_info(&self.labels.removed_message(total));
        }

        let result = refresh.await;
        self.finish_load(seq, result, UPDATE_FAILED);

        if failed > 0 {
            Err(ListError::PartialDeleteFailure { failed, total })
        } else {
            Ok(DeleteSummary::Deleted { count: total })
        }
    }

    async fn delete_one(&self, id: &str) -> bool {
        match self.service.delete_by_id(id).await {
            Ok(()) => {
                debug!(id, "Deleted {}", self.labels.singular);
                true
            }
            Err(e) => {
                error!(id, error = %e, "Cannot delete {}", self.labels.singular);
                false
            }
        }
    }
}
