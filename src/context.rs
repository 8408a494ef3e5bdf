use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use tracing::error;
use uuid::Uuid;

use crate::commands::{CommandId, Reply};
use crate::config::Settings;
use crate::dispatcher::Dispatcher;
use crate::frame::Frame;
use crate::pubsub::PubSub;
use crate::stats::Stats;
use crate::store::Store;
use crate::Error;

/// The view of its connection a running command gets.
pub struct ExecutionContext<'a> {
    dispatcher: &'a Dispatcher,
    command_id: CommandId,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher, command_id: CommandId) -> Self {
        Self {
            dispatcher,
            command_id,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.dispatcher.id()
    }

    pub fn command_id(&self) -> CommandId {
        self.command_id
    }

    pub fn store(&self) -> &Store {
        &self.dispatcher.services().store
    }

    pub fn pubsub(&self) -> &PubSub {
        &self.dispatcher.services().pubsub
    }

    pub fn settings(&self) -> &Settings {
        &self.dispatcher.services().settings
    }

    pub fn stats(&self) -> &Arc<dyn Stats> {
        &self.dispatcher.services().stats
    }

    /// The configured shared secret, if any.
    pub fn password(&self) -> Option<&Bytes> {
        self.dispatcher.services().password.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.dispatcher.is_authenticated()
    }

    pub(crate) fn mark_authenticated(&self) {
        self.dispatcher.mark_authenticated();
    }

    /// Asks the whole server to stop.
    pub fn shutdown(&self) {
        self.dispatcher.services().shutdown.cancel();
    }

    /// Runs `job` on the worker pool. Its outcome becomes this command's response once
    /// every command received before it has been answered.
    pub fn defer<F>(&self, job: F) -> Reply
    where
        F: FnOnce() -> Result<Frame, Error> + Send + 'static,
    {
        let dispatcher = self.dispatcher.clone();
        let command_id = self.command_id;

        self.dispatcher.services().workers.submit(Box::new(move || {
            let result = match panic::catch_unwind(AssertUnwindSafe(job)) {
                Ok(result) => result.map_err(Error::in_execution),
                Err(_) => {
                    error!(command_id = %command_id, "Deferred command panicked");
                    Err(Error::Internal("deferred command panicked".to_string()))
                }
            };
            dispatcher.complete_async_execution(command_id, result);
        }));

        Reply::Deferred
    }
}
