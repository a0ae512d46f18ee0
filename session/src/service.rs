//! Service facade consumed by the request layer.

use std::sync::Arc;

use crate::command::Command;
use crate::error::Result;
use crate::session::Session;
use crate::status::StatusRecord;

/// Thin pass-through over the [`Session`] for request handlers.
///
/// Exactly one session instance exists per process; handlers share it
/// through this cloneable handle instead of ambient global state.
#[derive(Clone)]
pub struct VaralService {
    session: Arc<Session>,
}

impl VaralService {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Latest observed device status, or `None` if no heartbeat has ever
    /// been received. Never blocks on I/O.
    pub fn latest_status(&self) -> Option<StatusRecord> {
        self.session.latest()
    }

    /// Validate a raw operator input and forward it to the device.
    ///
    /// Returns the normalized command on success. An unrecognized input
    /// is rejected before anything touches the network; a validated
    /// command can still fail with a transient publish error while the
    /// broker connection is down.
    pub async fn send_command(&self, raw: &str) -> Result<Command> {
        let command = Command::parse(raw)?;
        self.session.publish(command).await?;
        Ok(command)
    }
}
