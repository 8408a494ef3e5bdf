use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use strum::{EnumCount, IntoEnumIterator};

use crate::commands::CommandType;

/// Sink for connection and command counters, shared by every connection.
///
/// `start_command` and `end_command` are always called in pairs for a command that
/// actually ran, including deferred ones whose end is recorded on completion.
pub trait Stats: Send + Sync {
    fn add_client(&self);

    fn remove_client(&self);

    fn start_command(&self, command_type: CommandType) -> Instant;

    fn end_command(&self, command_type: CommandType, start: Instant);

    /// Human readable summary for `INFO`.
    fn report(&self) -> String {
        String::new()
    }
}

#[derive(Debug, Default)]
struct CommandCounters {
    calls: AtomicU64,
    in_progress: AtomicU64,
    total_micros: AtomicU64,
}

/// Process wide statistics, reported by `INFO`.
#[derive(Debug)]
pub struct ServerStats {
    started_at: Instant,
    connected_clients: AtomicU64,
    total_connections: AtomicU64,
    total_commands: AtomicU64,
    commands: Vec<CommandCounters>,
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerStats {
    pub fn new() -> ServerStats {
        ServerStats {
            started_at: Instant::now(),
            connected_clients: AtomicU64::new(0),
            total_connections: AtomicU64::new(0),
            total_commands: AtomicU64::new(0),
            commands: (0..CommandType::COUNT)
                .map(|_| CommandCounters::default())
                .collect(),
        }
    }

    pub fn connected_clients(&self) -> u64 {
        self.connected_clients.load(Ordering::Relaxed)
    }

    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn total_commands(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }

    pub fn calls(&self, command_type: CommandType) -> u64 {
        self.counters(command_type).calls.load(Ordering::Relaxed)
    }

    pub fn in_progress(&self, command_type: CommandType) -> u64 {
        self.counters(command_type)
            .in_progress
            .load(Ordering::Relaxed)
    }

    /// Renders the counters in the `INFO` text format.
    pub fn render(&self) -> String {
        let mut info = format!(
            "# Server\r\nuptime_in_seconds:{}\r\n\r\n# Clients\r\nconnected_clients:{}\r\n\r\n\
             # Stats\r\ntotal_connections_received:{}\r\ntotal_commands_processed:{}\r\n\r\n\
             # Commandstats\r\n",
            self.started_at.elapsed().as_secs(),
            self.connected_clients(),
            self.total_connections(),
            self.total_commands(),
        );

        for command_type in CommandType::iter() {
            let counters = self.counters(command_type);
            let calls = counters.calls.load(Ordering::Relaxed);
            if calls == 0 {
                continue;
            }
            let usec = counters.total_micros.load(Ordering::Relaxed);
            info.push_str(&format!(
                "cmdstat_{}:calls={},usec={},usec_per_call={:.2}\r\n",
                command_type.as_ref().to_lowercase(),
                calls,
                usec,
                usec as f64 / calls as f64
            ));
        }

        info
    }

    fn counters(&self, command_type: CommandType) -> &CommandCounters {
        &self.commands[command_type as usize]
    }
}

impl Stats for ServerStats {
    fn add_client(&self) {
        self.connected_clients.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    fn remove_client(&self) {
        self.connected_clients.fetch_sub(1, Ordering::Relaxed);
    }

    fn start_command(&self, command_type: CommandType) -> Instant {
        self.counters(command_type)
            .in_progress
            .fetch_add(1, Ordering::Relaxed);
        Instant::now()
    }

    fn end_command(&self, command_type: CommandType, start: Instant) {
        let counters = self.counters(command_type);
        counters.in_progress.fetch_sub(1, Ordering::Relaxed);
        counters.calls.fetch_add(1, Ordering::Relaxed);
        counters
            .total_micros
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.total_commands.fetch_add(1, Ordering::Relaxed);
    }

    fn report(&self) -> String {
        self.render()
    }
}

/// Records the end of a command's timing span when dropped, so the span is closed
/// on every exit path.
pub struct CommandTimer {
    stats: Arc<dyn Stats>,
    command_type: CommandType,
    start: Instant,
}

impl CommandTimer {
    pub fn start(stats: Arc<dyn Stats>, command_type: CommandType) -> CommandTimer {
        let start = stats.start_command(command_type);
        CommandTimer {
            stats,
            command_type,
            start,
        }
    }

    /// Picks up a span opened earlier, e.g. when a deferred command started.
    pub fn resume(stats: Arc<dyn Stats>, command_type: CommandType, start: Instant) -> CommandTimer {
        CommandTimer {
            stats,
            command_type,
            start,
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        self.stats.end_command(self.command_type, self.start);
    }
}
