use serde::Serialize;
use voltwiz_core::flows::Question;

pub const ANSWER_ACTION_ID: &str = "advisor.answer.v1";
pub const RESTART_ACTION_ID: &str = "advisor.restart.v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ButtonElement> },
    Context { block_id: String, elements: Vec<TextObject> },
}

/// One outbound reply. `fallback_text` is the complete message for
/// text-only channels; `blocks` add buttons where the channel supports them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

impl MessageTemplate {
    pub fn buttons(&self) -> impl Iterator<Item = &ButtonElement> {
        self.blocks.iter().flat_map(|block| match block {
            Block::Actions { elements, .. } => elements.as_slice(),
            _ => &[],
        })
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        let elements = builder.build();
        if !elements.is_empty() {
            self.blocks.push(Block::Actions { block_id: block_id.into(), elements });
        }
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// A quick-reply button. `value` is the canonical answer token the core parses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerChoice {
    pub label: String,
    pub value: String,
}

impl AnswerChoice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

pub fn question_message(question: Question, text: &str, choices: &[AnswerChoice]) -> MessageTemplate {
    let key = question.key();
    MessageBuilder::new(text.to_owned())
        .section(format!("advisor.question.{key}.v1"), |section| {
            section.plain(text);
        })
        .actions(format!("advisor.question.{key}.choices.v1"), |actions| {
            for choice in choices {
                actions.button(
                    ButtonElement::new(ANSWER_ACTION_ID, choice.label.clone())
                        .value(choice.value.clone()),
                );
            }
        })
        .build()
}

pub fn notice_message(block_id: &str, text: &str) -> MessageTemplate {
    MessageBuilder::new(text.to_owned())
        .section(block_id.to_owned(), |section| {
            section.plain(text);
        })
        .build()
}

pub fn recommendation_message(text: &str, restart_label: &str) -> MessageTemplate {
    MessageBuilder::new(text.to_owned())
        .section("advisor.recommendation.summary.v1", |section| {
            section.mrkdwn(text);
        })
        .actions("advisor.recommendation.actions.v1", |actions| {
            actions.button(
                ButtonElement::new(RESTART_ACTION_ID, restart_label)
                    .style(ButtonStyle::Primary)
                    .value("restart"),
            );
        })
        .build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("advisor.error.summary.v1", |section| {
            section.plain(format!("⚠️ {summary}"));
        })
        .context("advisor.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

#[cfg(test)]
mod tests {
    use voltwiz_core::flows::Question;

    use super::{
        error_message, question_message, recommendation_message, AnswerChoice, Block,
        MessageBuilder, ANSWER_ACTION_ID, RESTART_ACTION_ID,
    };

    #[test]
    fn question_buttons_carry_canonical_values() {
        let message = question_message(
            Question::SmartMeter,
            "Do you have a smart meter?",
            &[AnswerChoice::new("Yes", "yes"), AnswerChoice::new("No", "no")],
        );

        assert_eq!(message.fallback_text, "Do you have a smart meter?");
        assert!(matches!(
            &message.blocks[0],
            Block::Section { block_id, .. } if block_id == "advisor.question.smart_meter.v1"
        ));
        let values: Vec<_> =
            message.buttons().map(|button| button.value.as_deref().unwrap_or_default()).collect();
        assert_eq!(values, vec!["yes", "no"]);
        assert!(message.buttons().all(|button| button.action_id == ANSWER_ACTION_ID));
    }

    #[test]
    fn free_text_questions_have_no_action_block() {
        let message = question_message(Question::DiscountStart, "Start hour?", &[]);
        assert_eq!(message.blocks.len(), 1);
        assert_eq!(message.buttons().count(), 0);
    }

    #[test]
    fn recommendation_offers_restart_button() {
        let message = recommendation_message("Recommended Provider: A - B", "Start over");
        let restart = message.buttons().next().expect("restart button");
        assert_eq!(restart.action_id, RESTART_ACTION_ID);
    }

    #[test]
    fn error_message_includes_correlation_context() {
        let message = error_message("Something went wrong", "req-9");
        assert!(matches!(
            &message.blocks[1],
            Block::Context { elements, .. } if elements[0].text().contains("req-9")
        ));
    }

    #[test]
    fn serialized_blocks_use_type_tags() {
        let message = MessageBuilder::new("hi")
            .section("s.v1", |section| {
                section.mrkdwn("*hi*");
            })
            .build();
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["blocks"][0]["type"], "section");
        assert_eq!(json["blocks"][0]["text"]["type"], "mrkdwn");
    }
}
