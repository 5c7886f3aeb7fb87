//! Command registration and lookup
//!
//! A [`Command`] pairs a unique name with a description, advisory argument
//! placeholders and a handler. The [`CommandRegistry`] keeps commands in
//! registration order; that order drives completion and `help` output.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DuplicatePolicy;
use crate::error::{Error, Result};
use crate::session::CommandContext;

/// Result returned by command and line handlers
pub type HandlerResult = anyhow::Result<()>;

/// Handler invoked with the whitespace-split arguments following the name
pub type CommandHandler =
    Arc<dyn Fn(&mut CommandContext<'_>, &[String]) -> HandlerResult + Send + Sync>;

/// Handler invoked with a full line that matched no command
pub type LineHandler = Arc<dyn Fn(&mut CommandContext<'_>, &str) -> HandlerResult + Send + Sync>;

/// Name of the built-in help command
pub const HELP_COMMAND: &str = "help";

static COMMAND_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+$").expect("valid regex"));

/// A named unit of dispatch
#[derive(Clone)]
pub struct Command {
    name: String,
    description: String,
    arg_names: Vec<String>,
    handler: CommandHandler,
}

impl Command {
    /// Create a command without declared arguments
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            arg_names: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Declare argument placeholders, e.g. `["<string>"]`.
    ///
    /// These are shown in `help` only; arity is never enforced.
    pub fn with_args<I, S>(mut self, arg_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arg_names = arg_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arg_names(&self) -> &[String] {
        &self.arg_names
    }

    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    /// `name <arg> ...` as shown in help output
    pub fn usage(&self) -> String {
        if self.arg_names.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.arg_names.join(" "))
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arg_names", &self.arg_names)
            .finish_non_exhaustive()
    }
}

/// Name -> command mapping that remembers registration order
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    index: HashMap<String, usize>,
    on_duplicate: DuplicatePolicy,
}

impl CommandRegistry {
    pub fn new(on_duplicate: DuplicatePolicy) -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
            on_duplicate,
        }
    }

    /// Register a command.
    ///
    /// An existing command of the same name is replaced in place, or the call
    /// fails with `DuplicateCommand` under [`DuplicatePolicy::Reject`].
    pub fn register(&mut self, command: Command) -> Result<()> {
        validate_name(command.name())?;

        match self.index.get(command.name()).copied() {
            Some(slot) => match self.on_duplicate {
                DuplicatePolicy::Replace => {
                    debug!("Replacing command '{}'", command.name());
                    self.commands[slot] = command;
                    Ok(())
                }
                DuplicatePolicy::Reject => Err(Error::DuplicateCommand {
                    name: command.name().to_string(),
                }),
            },
            None => {
                debug!("Registering command '{}'", command.name());
                self.index
                    .insert(command.name().to_string(), self.commands.len());
                self.commands.push(command);
                Ok(())
            }
        }
    }

    /// Register several commands, stopping at the first failure
    pub fn register_all<I>(&mut self, commands: I) -> Result<()>
    where
        I: IntoIterator<Item = Command>,
    {
        commands
            .into_iter()
            .try_for_each(|command| self.register(command))
    }

    /// Remove a command, returning it if it was registered
    pub fn unregister(&mut self, name: &str) -> Option<Command> {
        let slot = self.index.remove(name)?;
        let removed = self.commands.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Look up a command, failing with `CommandNotFound`
    pub fn lookup(&self, name: &str) -> Result<&Command> {
        self.get(name).ok_or_else(|| Error::CommandNotFound {
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.index.get(name).map(|&slot| &self.commands[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().map(Command::name)
    }

    /// Commands in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Command> + '_ {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.on_duplicate
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidCommandName {
            name: name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }

    if !COMMAND_NAME.is_match(name) {
        return Err(Error::InvalidCommandName {
            name: name.to_string(),
            reason: "name must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Built-in `help`: lists every command with its arguments and description
pub fn help_command() -> Command {
    Command::new(HELP_COMMAND, "List available commands.", |ctx, _args| {
        let lines: Vec<(String, String)> = ctx
            .registry()
            .iter()
            .map(|command| (command.usage(), command.description().to_string()))
            .collect();

        let width = lines.iter().map(|(usage, _)| usage.len()).max().unwrap_or(0);
        for (usage, description) in lines {
            ctx.print(&format!("  {:<width$}  {}", usage, description, width = width));
        }
        Ok(())
    })
}
