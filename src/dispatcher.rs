use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::classifier::classify;
use crate::commands::{Command, CommandId, CommandType, Reply};
use crate::config::{Config, Settings};
use crate::context::ExecutionContext;
use crate::error::{ERROR_NOT_AUTH, ERROR_UNIMPLEMENTED_COMMAND, ERROR_UNSUPPORTED_COMMAND};
use crate::frame::Frame;
use crate::pubsub::PubSub;
use crate::stats::{CommandTimer, Stats};
use crate::store::Store;
use crate::worker::WorkerPool;
use crate::Error;

/// Collaborators shared by every connection of a server.
#[derive(Clone)]
pub struct Services {
    pub store: Store,
    pub pubsub: PubSub,
    pub settings: Settings,
    pub password: Option<Bytes>,
    /// Cancelled to stop the whole server.
    pub shutdown: CancellationToken,
    pub stats: Arc<dyn Stats>,
    pub workers: Arc<dyn WorkerPool>,
}

impl Services {
    /// Must be called from within a tokio runtime, the store spawns its expiration task.
    pub fn new(config: &Config, stats: Arc<dyn Stats>, workers: Arc<dyn WorkerPool>) -> Services {
        Services {
            store: Store::new(),
            pubsub: PubSub::new(),
            settings: Settings::from(config),
            password: config.password.clone(),
            shutdown: CancellationToken::new(),
            stats,
            workers,
        }
    }
}

/// An entry waiting for its turn to be answered.
enum Pending {
    Command(Command),
    /// An error reply produced while something was in flight.
    Reply(Frame),
}

struct State {
    queue: VecDeque<Pending>,
    /// `None` once the connection is closed.
    sink: Option<UnboundedSender<Frame>>,
}

struct Inner {
    id: Uuid,
    services: Services,
    authenticated: AtomicBool,
    next_command_id: AtomicU64,
    closed: CancellationToken,
    state: Mutex<State>,
}

/// Per-connection command dispatcher.
///
/// Commands arrive one at a time from the connection's reader. Synchronous commands run
/// inline; asynchronous ones run on the worker pool and report back through
/// [`Dispatcher::complete_async_execution`]. While an asynchronous command is in flight,
/// everything received after it waits in a queue, so responses always leave in the order
/// the commands arrived.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Creates the dispatcher for a new connection. Responses are pushed onto `sink`.
    pub fn new(services: Services, sink: UnboundedSender<Frame>) -> Dispatcher {
        Dispatcher::with_id(Uuid::new_v4(), services, sink)
    }

    pub fn with_id(id: Uuid, services: Services, sink: UnboundedSender<Frame>) -> Dispatcher {
        services.stats.add_client();
        // Without a secret every connection starts out authenticated.
        let authenticated = services.password.is_none();

        Dispatcher {
            inner: Arc::new(Inner {
                id,
                services,
                authenticated: AtomicBool::new(authenticated),
                next_command_id: AtomicU64::new(1),
                closed: CancellationToken::new(),
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    sink: Some(sink),
                }),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub(crate) fn services(&self) -> &Services {
        &self.inner.services
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.authenticated.load(Ordering::Acquire)
    }

    pub(crate) fn mark_authenticated(&self) {
        self.inner.authenticated.store(true, Ordering::Release);
    }

    /// Cancelled once the connection is closed.
    pub fn closed(&self) -> CancellationToken {
        self.inner.closed.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Number of commands and replies waiting behind the one in flight, plus that one.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn on_command_received(&self, mut command: Command) {
        let id = self.inner.next_command_id.fetch_add(1, Ordering::Relaxed);
        command.assign_id(CommandId(id));

        let mut state = self.inner.state.lock();
        if state.sink.is_none() {
            debug!(command = %command, "Discarding command received after close");
            return;
        }

        if !state.queue.is_empty() {
            state.queue.push_back(Pending::Command(command));
            return;
        }

        if command.is_async() {
            state.queue.push_back(Pending::Command(command));
            if !self.begin_async_execution(&mut state) {
                self.drain(&mut state);
            }
            return;
        }

        if let Err(cause) = self.execute_command(&mut state, &command) {
            self.handle_failure(&mut state, cause);
        }
    }

    /// Entry point for failures raised outside of command execution, e.g. by the reader.
    pub fn exception_caught(&self, cause: Error) {
        let mut state = self.inner.state.lock();

        if let Error::Io(e) = &cause {
            debug!("Connection lost: {}", e);
            self.close(&mut state);
            return;
        }

        let frame = classify(&cause, &self.inner.id);
        if state.queue.is_empty() {
            self.write(&mut state, frame);
        } else {
            state.queue.push_back(Pending::Reply(frame));
        }
    }

    pub fn on_connection_closing(&self) {
        let mut state = self.inner.state.lock();
        self.close(&mut state);
    }

    /// Reports the outcome of the deferred command `id`.
    ///
    /// Panics if `id` is not the command at the head of the queue.
    pub fn complete_async_execution(&self, id: CommandId, result: Result<Frame, Error>) {
        let mut state = self.inner.state.lock();

        if state.sink.is_none() {
            debug!(command_id = %id, "Discarding completion for closed connection");
            return;
        }

        let found = match state.queue.front() {
            Some(Pending::Command(command)) if command.id() == id => None,
            Some(Pending::Command(command)) => Some(command.to_string()),
            Some(Pending::Reply(frame)) => Some(format!("reply {}", frame)),
            None => Some("nothing".to_string()),
        };
        if let Some(found) = found {
            error!(
                connection_id = %self.inner.id,
                command_id = %id,
                head = %found,
                "Completed command is not at the head of the queue"
            );
            // Nothing else may be written once ordering can no longer be trusted.
            self.close(&mut state);
            panic!(
                "command {} completed while {} was at the head of the queue",
                id, found
            );
        }

        let Some(Pending::Command(command)) = state.queue.pop_front() else {
            return;
        };

        {
            let _timer = command.async_start().map(|start| {
                CommandTimer::resume(self.inner.services.stats.clone(), command.command_type(), start)
            });
            match result {
                Ok(frame) => {
                    debug!(command = %command, response = %frame, "Completed async command");
                    self.write(&mut state, frame);
                }
                Err(cause) => self.handle_failure(&mut state, cause),
            }
        }

        self.drain(&mut state);
    }

    /// Answers queued entries from the front until the queue is empty or an
    /// asynchronous command is in flight.
    fn drain(&self, state: &mut State) {
        loop {
            let next_is_async = match state.queue.front() {
                None => return,
                Some(Pending::Command(command)) => command.is_async(),
                Some(Pending::Reply(_)) => false,
            };

            if next_is_async {
                if self.begin_async_execution(state) {
                    return;
                }
                continue;
            }

            match state.queue.pop_front() {
                Some(Pending::Reply(frame)) => self.write(state, frame),
                Some(Pending::Command(command)) => {
                    if let Err(cause) = self.execute_command(state, &command) {
                        self.handle_failure(state, cause);
                    }
                }
                None => return,
            }
        }
    }

    /// Starts the asynchronous command at the head of the queue. Returns `true` when it is
    /// left in flight, `false` when it was answered right away and removed.
    fn begin_async_execution(&self, state: &mut State) -> bool {
        let Some(Pending::Command(command)) = state.queue.front_mut() else {
            return false;
        };

        if let Some(rejection) = self.check_gates(command) {
            state.queue.pop_front();
            self.write(state, rejection);
            return false;
        }

        debug!(command = %command, "Starting async command");
        let command_type = command.command_type();
        let start = self.inner.services.stats.start_command(command_type);
        command.set_async_start(start);
        let result = command.execute(&ExecutionContext::new(self, command.id()));

        if let Ok(Reply::Deferred) = result {
            return true;
        }

        state.queue.pop_front();
        let _timer = CommandTimer::resume(self.inner.services.stats.clone(), command_type, start);
        match result {
            Ok(Reply::Frame(frame)) => self.write(state, frame),
            Ok(Reply::Deferred) => {}
            Err(cause) => self.handle_failure(state, cause),
        }
        false
    }

    fn execute_command(&self, state: &mut State, command: &Command) -> Result<(), Error> {
        if let Some(rejection) = self.check_gates(command) {
            self.write(state, rejection);
            return Ok(());
        }

        debug!(command = %command, "Executing command");
        let reply = {
            let _timer =
                CommandTimer::start(self.inner.services.stats.clone(), command.command_type());
            command.execute(&ExecutionContext::new(self, command.id()))?
        };

        match reply {
            Reply::Deferred => return Ok(()),
            Reply::Frame(frame) => {
                debug!(command = %command, response = %frame, "Executed command");
                self.write(state, frame);
            }
        }

        if command.is_of_type(CommandType::Quit) {
            self.close(state);
        }
        Ok(())
    }

    /// The reply for a command that must not run, if any.
    fn check_gates(&self, command: &Command) -> Option<Frame> {
        if self.inner.services.shutdown.is_cancelled() {
            return Some(classify(&Error::ShuttingDown, &self.inner.id));
        }

        if !self.is_authenticated() && !command.is_of_type(CommandType::Auth) {
            return Some(Frame::custom_error(ERROR_NOT_AUTH));
        }

        if !command.is_supported() && !self.inner.services.settings.allow_unsupported() {
            return Some(Frame::error(format!(
                "{}{}",
                command.command_type(),
                ERROR_UNSUPPORTED_COMMAND
            )));
        }

        if !command.is_implemented() {
            info!(command = %command.command_type(), "Received unimplemented command");
            return Some(Frame::error(format!(
                "{}{}",
                command.command_type(),
                ERROR_UNIMPLEMENTED_COMMAND
            )));
        }

        None
    }

    fn handle_failure(&self, state: &mut State, cause: Error) {
        if let Error::Io(e) = &cause {
            debug!("Connection lost: {}", e);
            self.close(state);
            return;
        }

        let frame = classify(&cause, &self.inner.id);
        self.write(state, frame);
    }

    fn write(&self, state: &mut State, frame: Frame) {
        let Some(sink) = &state.sink else {
            return;
        };
        if sink.send(frame).is_err() {
            debug!("Writer is gone, dropping response");
        }
    }

    fn close(&self, state: &mut State) {
        if state.sink.take().is_none() {
            return;
        }

        debug!(connection_id = %self.inner.id, "Closing connection");

        // The completion of an in-flight command is discarded, so its timing ends here.
        for pending in state.queue.drain(..) {
            if let Pending::Command(command) = pending {
                if let Some(start) = command.async_start() {
                    self.inner
                        .services
                        .stats
                        .end_command(command.command_type(), start);
                }
            }
        }

        self.inner.services.stats.remove_client();
        self.inner.closed.cancel();
    }
}
