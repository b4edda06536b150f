//! Update cursor: decides whether a fetched batch carries anything new.

use serde_json::Value;

use crate::{errors::Error, Result};

/// One fetched update, identified but not yet interpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct RawUpdate {
    pub update_id: i64,
    pub body: Value,
}

impl RawUpdate {
    pub fn from_value(body: Value) -> Result<Self> {
        let update_id = body
            .get("update_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::Decoration("update without a numeric update_id".to_string()))?;
        Ok(Self { update_id, body })
    }

    /// Parse a `getUpdates` result array.
    ///
    /// The head must carry an id, since it is the one that gets admitted and
    /// acknowledged. Later entries without one are dropped.
    pub fn batch_from_value(result: Value) -> Result<Vec<Self>> {
        let Value::Array(items) = result else {
            return Err(Error::Decoration(format!(
                "getUpdates result is not an array: {result}"
            )));
        };

        let mut items = items.into_iter();
        let Some(head) = items.next() else {
            return Ok(Vec::new());
        };

        let mut batch = vec![Self::from_value(head)?];
        for item in items {
            match Self::from_value(item) {
                Ok(update) => batch.push(update),
                Err(e) => tracing::debug!(error = %e, "dropping batch entry"),
            }
        }
        Ok(batch)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Admit {
    /// The batch had no elements.
    Empty,
    /// The head was already admitted; nothing new.
    Stale { update_id: i64 },
    /// The head is new and the cursor now points at it.
    Fresh(RawUpdate),
}

/// Last admitted update id. In-memory only.
///
/// Only the head of each batch is considered: older queued updates behind it
/// are skipped rather than drained one by one.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateCursor {
    last: Option<i64>,
}

impl UpdateCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<i64> {
        self.last
    }

    /// Offset that asks the server to drop everything up to the batch head.
    pub fn ack_offset(batch: &[RawUpdate]) -> Option<i64> {
        batch.first().map(|u| u.update_id + 1)
    }

    pub fn admit(&mut self, batch: Vec<RawUpdate>) -> Admit {
        let Some(head) = batch.into_iter().next() else {
            return Admit::Empty;
        };

        // A head at or below the cursor was delivered already; the cursor
        // never moves backwards.
        if self.last.is_some_and(|last| head.update_id <= last) {
            return Admit::Stale {
                update_id: head.update_id,
            };
        }

        self.last = Some(head.update_id);
        Admit::Fresh(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(ids: &[i64]) -> Vec<RawUpdate> {
        ids.iter()
            .map(|id| RawUpdate::from_value(json!({ "update_id": id })).unwrap())
            .collect()
    }

    #[test]
    fn empty_batch_is_empty() {
        let mut c = UpdateCursor::new();
        assert_eq!(c.admit(Vec::new()), Admit::Empty);
        assert_eq!(c.last(), None);
        assert_eq!(UpdateCursor::ack_offset(&[]), None);
    }

    #[test]
    fn repeated_head_is_stale() {
        let mut c = UpdateCursor::new();
        assert!(matches!(c.admit(batch(&[100])), Admit::Fresh(u) if u.update_id == 100));
        assert_eq!(c.admit(batch(&[100])), Admit::Stale { update_id: 100 });
        assert_eq!(c.last(), Some(100));
    }

    #[test]
    fn only_the_head_is_considered() {
        let mut c = UpdateCursor::new();
        match c.admit(batch(&[5, 6, 7])) {
            Admit::Fresh(u) => assert_eq!(u.update_id, 5),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(c.last(), Some(5));
        assert_eq!(UpdateCursor::ack_offset(&batch(&[5, 6, 7])), Some(6));
    }

    #[test]
    fn cursor_never_regresses() {
        let mut c = UpdateCursor::new();
        let mut max_seen = None;
        let batches: [&[i64]; 8] = [&[3], &[4], &[2], &[4, 5], &[9], &[1, 9], &[], &[10]];
        for ids in batches {
            c.admit(batch(ids));
            assert!(c.last() >= max_seen);
            max_seen = c.last();
        }
        assert_eq!(c.last(), Some(10));
        assert_eq!(c.admit(batch(&[7])), Admit::Stale { update_id: 7 });
        assert_eq!(c.last(), Some(10));
    }

    #[test]
    fn malformed_entries_behind_the_head_are_dropped() {
        let batch = RawUpdate::batch_from_value(json!([
            { "update_id": 10 },
            { "message": {} },
            { "update_id": 12 }
        ]))
        .unwrap();
        let ids: Vec<i64> = batch.iter().map(|u| u.update_id).collect();
        assert_eq!(ids, vec![10, 12]);
        assert_eq!(UpdateCursor::ack_offset(&batch), Some(11));

        let err = RawUpdate::batch_from_value(json!([{ "message": {} }, { "update_id": 3 }]))
            .unwrap_err();
        assert!(matches!(err, Error::Decoration(_)));
    }

    #[test]
    fn update_without_id_is_rejected() {
        let err = RawUpdate::from_value(json!({ "message": {} })).unwrap_err();
        assert!(matches!(err, Error::Decoration(_)));
        let err = RawUpdate::batch_from_value(json!({ "update_id": 1 })).unwrap_err();
        assert!(matches!(err, Error::Decoration(_)));
    }
}
