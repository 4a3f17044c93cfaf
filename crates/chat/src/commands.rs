use voltwiz_core::config::DEFAULT_RESTART_KEYWORDS;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Reset,
    Help,
    Unknown { name: String },
}

impl ChatCommand {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Reset => "reset",
            Self::Help => "help",
            Self::Unknown { name } => name,
        }
    }
}

/// What a free-text message means before it reaches the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    Command(ChatCommand),
    Answer(String),
}

/// Plain-text words that restart the conversation, matched case-insensitively
/// against the whole trimmed message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestartKeywords {
    keywords: Vec<String>,
}

impl RestartKeywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.into().trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        self.keywords.iter().any(|keyword| *keyword == text)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for RestartKeywords {
    fn default() -> Self {
        Self::new(DEFAULT_RESTART_KEYWORDS)
    }
}

/// Parses `/start`, `/reset`, `/help` (optionally addressed as `/cmd@bot`).
/// Returns `None` for text that is not a slash command.
pub fn parse_command(text: &str) -> Option<ChatCommand> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next().unwrap_or_default();
    let name = word.split('@').next().unwrap_or_default().to_lowercase();
    Some(command_from_name(&name))
}

pub fn command_from_name(name: &str) -> ChatCommand {
    match name.trim().trim_start_matches('/').to_lowercase().as_str() {
        "start" => ChatCommand::Start,
        "reset" => ChatCommand::Reset,
        "help" => ChatCommand::Help,
        other => ChatCommand::Unknown { name: other.to_owned() },
    }
}

pub fn classify_text(text: &str, restart: &RestartKeywords) -> Inbound {
    if let Some(command) = parse_command(text) {
        return Inbound::Command(command);
    }
    if restart.matches(text) {
        return Inbound::Command(ChatCommand::Start);
    }
    if text.trim().eq_ignore_ascii_case("help") {
        return Inbound::Command(ChatCommand::Help);
    }
    Inbound::Answer(text.to_owned())
}
