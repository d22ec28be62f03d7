//! Offset cursors shared by every paged operation.
//!
//! A cursor is the decimal offset of the next item to request. The empty
//! cursor is the first page; a page with no items ends the walk and yields no
//! cursor.

use crate::error::{ConnectorError, ConnectorResult};

pub fn decode(cursor: Option<&str>) -> ConnectorResult<u32> {
    match cursor.map(str::trim) {
        None | Some("") => Ok(0),
        Some(raw) => raw.parse::<u32>().map_err(|_| ConnectorError::InvalidCursor {
            cursor: raw.to_string()
        })
    }
}

pub fn encode(offset: u32, count: usize) -> String {
    (u64::from(offset) + count as u64).to_string()
}

/// Cursor to hand back after a page of `count` raw items fetched at `offset`.
pub fn next_cursor(offset: u32, count: usize) -> Option<String> {
    (count > 0).then(|| encode(offset, count))
}

/// One page of results plus the cursor for the following page, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None
        }
    }

    pub fn empty() -> Self {
        Self::last(Vec::new())
    }
}
