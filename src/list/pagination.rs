//! Page window and pagination predicates.
//!
//! Backends either report a page count or they don't. Both cases go through
//! [`PaginationInfo`] so the four predicates are implemented once per
//! variant instead of branching on `count_of_pages` everywhere.

use anyhow::{Result, bail};

use crate::models::PagesInfo;

/// Client-held cursor into a server-paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    max_items: u32,
    skip_count: u32,
}

impl PageWindow {
    pub fn new(max_items: u32, skip_count: u32) -> Result<Self> {
        if max_items == 0 {
            bail!("Page size must be greater than zero");
        }
        Ok(Self {
            max_items,
            skip_count,
        })
    }

    /// First page of the given size.
    pub fn first(max_items: u32) -> Result<Self> {
        Self::new(max_items, 0)
    }

    pub fn max_items(&self) -> u32 {
        self.max_items
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationInfo {
    /// The server reported how many pages exist.
    Known { current: u32, total: u32 },
    /// No total available; infer from the size of the last page.
    Unknown { current: u32, last_page_was_full: bool },
}

impl PaginationInfo {
    /// Classify server metadata. A reported page count of zero counts as absent.
    pub fn from_pages_info(info: &PagesInfo, last_page_len: usize, max_items: u32) -> Self {
        let current = info.current_page_number.unwrap_or(0);
        match info.count_of_pages {
            Some(total) if total > 0 => PaginationInfo::Known { current, total },
            _ => PaginationInfo::Unknown {
                current,
                last_page_was_full: last_page_len == max_items as usize,
            },
        }
    }

    pub fn has_next_page(&self) -> bool {
        match *self {
            PaginationInfo::Known { current, total } => current < total,
            PaginationInfo::Unknown {
                last_page_was_full, ..
            } => last_page_was_full,
        }
    }

    pub fn has_previous_page(&self) -> bool {
        match *self {
            PaginationInfo::Known { current, .. } | PaginationInfo::Unknown { current, .. } => {
                current > 1
            }
        }
    }

    pub fn has_last_page(&self) -> bool {
        match *self {
            PaginationInfo::Known { current, total } => current < total,
            PaginationInfo::Unknown { .. } => false,
        }
    }

    pub fn is_paginated(&self) -> bool {
        match *self {
            PaginationInfo::Known { total, .. } => total > 1,
            PaginationInfo::Unknown {
                current,
                last_page_was_full,
            } => last_page_was_full || current > 1,
        }
    }
}
