use connect_core::{
    password_and_salt_hash, Packet, Request, RequestResult, SequenceId, StatusCode,
    STATUS_ERROR_GENERIC, STATUS_SUCCESS,
};
use tokio::sync::oneshot;
use tracing::debug;

use crate::connection::Connect;
use crate::correlation::RequestRecord;
use crate::error::{Error, Result};

impl Connect {
    /// Send `request` and return without waiting for its result
    ///
    /// Fails with [`Error::NotConnected`] before doing anything when there is
    /// no connection. On `Err` the callback is dropped without being called;
    /// on `Ok` it is called exactly once, with the authority's result or with
    /// status 255 when the connection goes away first. A write that fails
    /// mid-frame takes the connection down with it, so that case reports `Ok`
    /// and a 255 callback.
    pub async fn request_later<F>(&self, request: Request, callback: F) -> Result<SequenceId>
    where
        F: FnOnce(StatusCode, Option<RequestResult>) + Send + 'static,
    {
        let link = self.link()?;
        let sequence_id = link.table.assign_id()?;
        let bytes = link
            .writer
            .encode(&Packet::Request {
                sequence_id,
                request: request.clone(),
            })
            .map_err(Error::Io)?;

        // Registered before the frame is queued so a fast result always finds its record.
        link.table
            .register(sequence_id, RequestRecord::new(request, callback))?;

        // Nothing is awaited between registering and queueing, so a caller
        // dropped past this point still gets its frame written whole.
        let outcome = match link.writer.submit(bytes) {
            Ok(written) => written.wait().await,
            Err(err) => Err(err),
        };

        if let Err(err) = outcome {
            if link.table.remove(sequence_id).is_some() {
                return Err(err);
            }
            // A teardown got there first and has already completed the callback.
            debug!(sequence_id, error = %err, "write failed on a closing connection");
        }
        Ok(sequence_id)
    }

    /// Send `request` and wait for its status code and decoded result
    ///
    /// Status 255 with no result means the connection was torn down first.
    pub async fn request(&self, request: Request) -> Result<(StatusCode, Option<RequestResult>)> {
        let (tx, rx) = oneshot::channel();
        self.request_later(request, move |status_code, result| {
            let _ = tx.send((status_code, result));
        })
        .await?;
        rx.await.map_err(|_| Error::Canceled)
    }

    /// [`request`](Self::request) for threads outside the async runtime
    ///
    /// # Panics
    ///
    /// Panics when called from within an async execution context.
    pub fn blocking_request(&self, request: Request) -> Result<(StatusCode, Option<RequestResult>)> {
        let runtime = self.link()?.runtime;
        runtime.block_on(self.request(request))
    }

    /// Authenticate against the authority with its salt challenge
    ///
    /// Returns the authority's status for the `Authenticate` request, or the
    /// status of a failed `GetSalt`.
    pub async fn login(&self, username: &str, password: &str) -> Result<StatusCode> {
        let salt = match self.request(Request::GetSalt).await? {
            (STATUS_SUCCESS, Some(RequestResult::GetSalt { salt })) => salt,
            (STATUS_SUCCESS, _) => return Ok(STATUS_ERROR_GENERIC),
            (status_code, _) => return Ok(status_code),
        };

        let (status_code, _) = self
            .request(Request::Authenticate {
                username: username.to_string(),
                password: password_and_salt_hash(password, &salt),
            })
            .await?;
        Ok(status_code)
    }
}
