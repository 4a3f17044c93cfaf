use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use voltwiz_chat::commands::ChatCommand;
use voltwiz_chat::{AdvisorService, MessageTemplate};
use voltwiz_core::{Catalog, UserId};

use super::{load_config, CommandResult, EXIT_CATALOG, EXIT_CONFIG, EXIT_MESSAGES, EXIT_RUNTIME};

const CLI_USER: &str = "cli";

pub fn run<R: BufRead, W: Write>(config_path: Option<&Path>, input: R, output: W) -> CommandResult {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };
    let catalog = match Catalog::load_or_embedded(config.catalog.path.as_deref()) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure("chat", "catalog_load", error.to_string(), EXIT_CATALOG)
        }
    };
    let advisor = match AdvisorService::from_config(&config, Arc::new(catalog)) {
        Ok(advisor) => advisor,
        Err(error) => {
            return CommandResult::failure("chat", "message_templates", error.to_string(), EXIT_MESSAGES)
        }
    };

    match converse(&advisor, input, output) {
        Ok(()) => CommandResult::text(String::new()),
        Err(error) => CommandResult::failure("chat", "runtime", format!("{error:#}"), EXIT_RUNTIME),
    }
}

/// Runs one conversation until it completes, the input ends, or the user
/// types `quit`.
pub fn converse<R: BufRead, W: Write>(
    advisor: &AdvisorService,
    mut input: R,
    mut output: W,
) -> Result<()> {
    let user = UserId::from(CLI_USER);
    let opening = advisor.handle_command(&user, &ChatCommand::Start)?;
    write_replies(&mut output, &opening)?;

    let mut line = String::new();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line).context("failed to read from stdin")? == 0 {
            writeln!(output)?;
            return Ok(());
        }
        let text = line.trim();
        if matches!(text, "quit" | "exit") {
            return Ok(());
        }

        let replies = advisor.handle_text(&user, text)?;
        write_replies(&mut output, &replies)?;

        if advisor.conversations().is_complete(&user)? {
            return Ok(());
        }
    }
}

fn write_replies<W: Write>(output: &mut W, replies: &[MessageTemplate]) -> Result<()> {
    for reply in replies {
        writeln!(output, "{}", reply.fallback_text)?;
    }
    Ok(())
}
