use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use connect_core::{Request, RequestKind, RequestResult, SequenceId, StatusCode};
use connect_fabric::codec::RequestKindLookup;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Completion callback of an outstanding request
pub type ResultCallback = Box<dyn FnOnce(StatusCode, Option<RequestResult>) + Send + 'static>;

/// A request awaiting its result
pub struct RequestRecord {
    request: Request,
    callback: ResultCallback,
}

impl RequestRecord {
    pub fn new<F>(request: Request, callback: F) -> Self
    where
        F: FnOnce(StatusCode, Option<RequestResult>) + Send + 'static,
    {
        Self {
            request,
            callback: Box::new(callback),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    fn complete(self, status_code: StatusCode, result: Option<RequestResult>) {
        (self.callback)(status_code, result)
    }
}

impl std::fmt::Debug for RequestRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRecord")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Records {
    pending: HashMap<SequenceId, RequestRecord>,
    closed: bool,
}

/// Pending requests of one connection generation, keyed by sequence id
///
/// Registration, resolution and draining all go through one mutex. Callbacks
/// always run after the lock is released, so a callback may issue new requests.
#[derive(Default)]
pub struct CorrelationTable {
    next_id: AtomicI32,
    records: Mutex<Records>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next sequence id (the first is 1)
    ///
    /// Ids never wrap: once `i32::MAX` has been handed out every further call
    /// fails with [`Error::SequenceExhausted`].
    pub fn assign_id(&self) -> Result<SequenceId> {
        self.next_id
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |id| id.checked_add(1))
            .map(|previous| previous + 1)
            .map_err(|_| Error::SequenceExhausted)
    }

    /// Insert a pending record under an id reserved with [`assign_id`](Self::assign_id)
    pub fn register(&self, id: SequenceId, record: RequestRecord) -> Result<()> {
        let mut records = self.records.lock();
        if records.closed {
            return Err(Error::NotConnected);
        }
        if records.pending.contains_key(&id) {
            return Err(Error::DuplicateSequence(id));
        }
        records.pending.insert(id, record);
        Ok(())
    }

    /// Complete the record for `id`, if there is one
    ///
    /// Unknown ids (duplicates, or results arriving after local cleanup) are
    /// ignored and leave every other record untouched.
    pub fn resolve(
        &self,
        id: SequenceId,
        status_code: StatusCode,
        result: Option<RequestResult>,
    ) -> bool {
        let record = self.records.lock().pending.remove(&id);
        match record {
            Some(record) => {
                record.complete(status_code, result);
                true
            }
            None => false,
        }
    }

    /// Withdraw a record without running its callback
    pub fn remove(&self, id: SequenceId) -> Option<RequestRecord> {
        self.records.lock().pending.remove(&id)
    }

    /// Kind of the request pending under `id`, or `None` if there is none
    pub fn lookup(&self, id: SequenceId) -> Option<RequestKind> {
        self.records
            .lock()
            .pending
            .get(&id)
            .map(|record| record.request.kind())
    }

    /// Close the table and complete every pending record with `status_code`
    ///
    /// After this returns nothing can be registered or resolved here again.
    /// Returns how many records were completed.
    pub fn drain_all(&self, status_code: StatusCode, result: Option<RequestResult>) -> usize {
        let drained = {
            let mut records = self.records.lock();
            records.closed = true;
            std::mem::take(&mut records.pending)
        };

        let count = drained.len();
        for (_, record) in drained {
            record.complete(status_code, result.clone());
        }
        count
    }

    pub fn len(&self) -> usize {
        self.records.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.records.lock().closed
    }
}

impl RequestKindLookup for CorrelationTable {
    fn request_kind(&self, sequence_id: SequenceId) -> Option<RequestKind> {
        self.lookup(sequence_id)
    }
}
