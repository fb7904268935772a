//! Scripted [`GitExecutor`] for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::errors::GitError;
use crate::git::{CommandOutput, GitCommand, GitExecutor};

/// Records every command and replays canned outputs keyed by the
/// space-joined argument list. Unscripted commands succeed silently.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<GitCommand>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue `output` for the next invocation of `args`.
    pub(crate) fn respond(&self, args: &str, output: CommandOutput) {
        self.responses
            .lock()
            .unwrap()
            .entry(args.to_string())
            .or_default()
            .push_back(output);
    }

    /// Argument lists of every command run so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(key).collect()
    }

    /// Every command run so far, with environment overrides.
    pub(crate) fn commands(&self) -> Vec<GitCommand> {
        self.calls.lock().unwrap().clone()
    }
}

fn key(command: &GitCommand) -> String {
    command.args().join(" ")
}

impl GitExecutor for ScriptedExecutor {
    async fn execute(&self, command: &GitCommand) -> Result<CommandOutput, GitError> {
        self.calls.lock().unwrap().push(command.clone());
        let output = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&key(command))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| CommandOutput::ok(""));
        Ok(output)
    }
}
