//! Localized reply text. Every user-facing string is a `tera` template keyed
//! by `<locale>/<name>`; both locales must define the same names.

mod en;
mod he;

use std::error::Error as _;

use rust_decimal::Decimal;
use tera::{Context, Tera};
use thiserror::Error;
use voltwiz_core::config::Locale;
use voltwiz_core::flows::{Question, Rejection};
use voltwiz_core::recommendation::{ChoiceBasis, NextStep, RecommendationSummary};

use crate::blocks::{self, AnswerChoice, MessageTemplate};

const REQUIRED_TEMPLATES: &[&str] = &[
    "welcome",
    "help",
    "reset",
    "restart_hint",
    "completed",
    "no_plan",
    "error",
    "unknown_command",
    "question.smart_meter",
    "question.priority",
    "question.discount_start",
    "question.discount_end",
    "question.min_discount",
    "choice.yes",
    "choice.no",
    "choice.max_discount",
    "choice.time_specific",
    "choice.no_minimum",
    "choice.restart",
    "rejection.expected_yes_no",
    "rejection.expected_priority_choice",
    "rejection.invalid_hour",
    "rejection.negative_discount",
    "rejection.discount_above_maximum",
    "rejection.invalid_discount",
    "rejection.no_pending_question",
    "hours.all_day",
    "step.contact_vendor",
    "step.install_smart_meter",
    "step.no_smart_meter_needed",
    "step.shift_usage",
    "step.enjoy_all_day",
    "recommendation",
];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("failed to load `{locale}` message templates: {message}")]
    Load { locale: Locale, message: String },
    #[error("`{locale}` locale is missing message template `{name}`")]
    MissingTemplate { locale: Locale, name: String },
    #[error("failed to render message `{name}`: {message}")]
    Render { name: String, message: String },
}

fn locale_templates(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => en::TEMPLATES,
        Locale::He => he::TEMPLATES,
    }
}

fn locale_aliases(locale: Locale) -> &'static [(Question, &'static str, &'static str)] {
    match locale {
        Locale::En => en::ANSWER_ALIASES,
        Locale::He => he::ANSWER_ALIASES,
    }
}

pub struct MessageCatalog {
    tera: Tera,
    locale: Locale,
}

impl std::fmt::Debug for MessageCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCatalog").field("locale", &self.locale).finish_non_exhaustive()
    }
}

impl MessageCatalog {
    /// Loads the templates of every locale so a missing or malformed template
    /// fails at startup rather than mid-conversation.
    pub fn new(locale: Locale) -> Result<Self, MessageError> {
        let mut tera = Tera::default();
        for candidate in Locale::ALL {
            let templates = locale_templates(candidate);
            for name in REQUIRED_TEMPLATES {
                if !templates.iter().any(|(defined, _)| defined == name) {
                    return Err(MessageError::MissingTemplate {
                        locale: candidate,
                        name: (*name).to_owned(),
                    });
                }
            }
            tera.add_raw_templates(
                templates
                    .iter()
                    .map(|(name, body)| (format!("{}/{name}", candidate.as_str()), *body)),
            )
            .map_err(|error| MessageError::Load { locale: candidate, message: describe(&error) })?;
        }

        Ok(Self { tera, locale })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn template_count(&self) -> usize {
        self.tera.get_template_names().count()
    }

    pub fn welcome(&self) -> Result<MessageTemplate, MessageError> {
        self.notice("advisor.welcome.v1", "welcome")
    }

    pub fn help(&self) -> Result<MessageTemplate, MessageError> {
        self.notice("advisor.help.v1", "help")
    }

    pub fn reset_notice(&self) -> Result<MessageTemplate, MessageError> {
        self.notice("advisor.reset.v1", "reset")
    }

    pub fn restart_hint(&self) -> Result<MessageTemplate, MessageError> {
        self.notice("advisor.restart_hint.v1", "restart_hint")
    }

    pub fn completed(&self) -> Result<MessageTemplate, MessageError> {
        self.notice("advisor.completed.v1", "completed")
    }

    pub fn no_plan(&self) -> Result<MessageTemplate, MessageError> {
        self.notice("advisor.no_plan.v1", "no_plan")
    }

    pub fn unknown_command(&self, name: &str) -> Result<MessageTemplate, MessageError> {
        let mut context = Context::new();
        context.insert("name", name);
        let text = self.render("unknown_command", &context)?;
        Ok(blocks::notice_message("advisor.unknown_command.v1", &text))
    }

    pub fn error(&self, correlation_id: &str) -> Result<MessageTemplate, MessageError> {
        let text = self.text("error")?;
        Ok(blocks::error_message(&text, correlation_id))
    }

    pub fn question(&self, question: Question) -> Result<MessageTemplate, MessageError> {
        let text = self.text(&format!("question.{}", question.key()))?;
        let choices = match question {
            Question::SmartMeter => vec![
                AnswerChoice::new(self.text("choice.yes")?, "yes"),
                AnswerChoice::new(self.text("choice.no")?, "no"),
            ],
            Question::Priority => vec![
                AnswerChoice::new(self.text("choice.max_discount")?, "1"),
                AnswerChoice::new(self.text("choice.time_specific")?, "2"),
            ],
            Question::MinDiscount => vec![
                AnswerChoice::new(self.text("choice.no_minimum")?, "0"),
                AnswerChoice::new("5%", "5"),
                AnswerChoice::new("10%", "10"),
                AnswerChoice::new("15%", "15"),
            ],
            Question::DiscountStart | Question::DiscountEnd => Vec::new(),
        };
        Ok(blocks::question_message(question, &text, &choices))
    }

    pub fn rejection(&self, reason: Rejection) -> Result<MessageTemplate, MessageError> {
        let text = self.text(&format!("rejection.{}", reason.key()))?;
        Ok(blocks::notice_message("advisor.rejection.v1", &text))
    }

    pub fn recommendation(
        &self,
        summary: &RecommendationSummary,
    ) -> Result<MessageTemplate, MessageError> {
        let text = self.recommendation_text(summary)?;
        let restart_label = self.text("choice.restart")?;
        Ok(blocks::recommendation_message(&text, &restart_label))
    }

    pub fn recommendation_text(
        &self,
        summary: &RecommendationSummary,
    ) -> Result<String, MessageError> {
        let hours = match summary.hours {
            Some(window) => window.to_string(),
            None => self.text("hours.all_day")?,
        };
        let next_steps = summary
            .next_steps
            .iter()
            .map(|step| self.next_step(step))
            .collect::<Result<Vec<_>, _>>()?;
        let basis = match summary.basis {
            ChoiceBasis::HighestDiscount => "highest_discount",
            ChoiceBasis::PreferredHours => "preferred_hours",
        };

        let mut context = Context::new();
        context.insert("vendor", &summary.vendor);
        context.insert("plan_name", &summary.plan_name);
        context.insert("discount", &format_pct(summary.discount_pct));
        context.insert("hours", &hours);
        context.insert("requires_smart_meter", &summary.requires_smart_meter);
        context.insert("basis", basis);
        context.insert("above_mean", &summary.is_above_mean());
        context.insert("delta", &summary.signed_delta());
        context.insert("delta_abs", &format_pct(summary.delta_vs_mean_pct.abs()));
        context.insert("next_steps", &next_steps);
        self.render("recommendation", &context)
    }

    /// Maps localized or descriptive replies onto the tokens the core answer
    /// parser understands; anything unrecognized passes through trimmed.
    pub fn canonical_answer(&self, question: Question, raw: &str) -> String {
        let trimmed = raw.trim();
        let lowered = trimmed.to_lowercase();
        Locale::ALL
            .into_iter()
            .flat_map(locale_aliases)
            .find(|(target, alias, _)| *target == question && *alias == lowered)
            .map(|(_, _, canonical)| (*canonical).to_owned())
            .unwrap_or_else(|| trimmed.to_owned())
    }

    /// Renders every template of the active locale once, including a sample
    /// recommendation. Returns the number of templates exercised.
    pub fn verify(&self) -> Result<usize, MessageError> {
        for name in REQUIRED_TEMPLATES {
            match *name {
                "recommendation" => {
                    self.recommendation_text(&sample_summary())?;
                }
                _ => {
                    let mut context = Context::new();
                    context.insert("name", "sample");
                    context.insert("vendor", "Sample Power");
                    context.insert("plan", "Sample Plan");
                    context.insert("hours", "18:00-22:00");
                    self.render(name, &context)?;
                }
            }
        }
        Ok(REQUIRED_TEMPLATES.len())
    }

    fn next_step(&self, step: &NextStep) -> Result<String, MessageError> {
        let mut context = Context::new();
        let name = match step {
            NextStep::ContactVendor { vendor, plan } => {
                context.insert("vendor", vendor);
                context.insert("plan", plan);
                "step.contact_vendor"
            }
            NextStep::InstallSmartMeter => "step.install_smart_meter",
            NextStep::NoSmartMeterNeeded => "step.no_smart_meter_needed",
            NextStep::ShiftUsageToDiscountHours { hours } => {
                context.insert("hours", &hours.to_string());
                "step.shift_usage"
            }
            NextStep::EnjoyAllDayDiscount => "step.enjoy_all_day",
        };
        self.render(name, &context)
    }

    fn notice(&self, block_id: &str, name: &str) -> Result<MessageTemplate, MessageError> {
        let text = self.text(name)?;
        Ok(blocks::notice_message(block_id, &text))
    }

    fn text(&self, name: &str) -> Result<String, MessageError> {
        self.render(name, &Context::new())
    }

    fn render(&self, name: &str, context: &Context) -> Result<String, MessageError> {
        let qualified = format!("{}/{name}", self.locale.as_str());
        self.tera
            .render(&qualified, context)
            .map(|rendered| rendered.trim_end().to_owned())
            .map_err(|error| MessageError::Render { name: qualified, message: describe(&error) })
    }
}

fn format_pct(value: Decimal) -> String {
    format!("{value:.1}")
}

fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn sample_summary() -> RecommendationSummary {
    RecommendationSummary {
        vendor: "Sample Power".to_owned(),
        plan_name: "Sample Plan".to_owned(),
        discount_pct: Decimal::new(150, 1),
        hours: None,
        requires_smart_meter: true,
        delta_vs_mean_pct: Decimal::new(25, 1),
        basis: ChoiceBasis::HighestDiscount,
        next_steps: vec![
            NextStep::ContactVendor {
                vendor: "Sample Power".to_owned(),
                plan: "Sample Plan".to_owned(),
            },
            NextStep::InstallSmartMeter,
            NextStep::EnjoyAllDayDiscount,
        ],
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use voltwiz_core::config::Locale;
    use voltwiz_core::domain::plan::HourWindow;
    use voltwiz_core::flows::{Question, Rejection};
    use voltwiz_core::recommendation::{ChoiceBasis, NextStep, RecommendationSummary};

    use super::{locale_templates, MessageCatalog, REQUIRED_TEMPLATES};

    fn catalog(locale: Locale) -> MessageCatalog {
        MessageCatalog::new(locale).expect("templates load")
    }

    fn evening_summary() -> RecommendationSummary {
        let hours = HourWindow::EVENING;
        RecommendationSummary {
            vendor: "Basic Power".to_owned(),
            plan_name: "Evening Basic".to_owned(),
            discount_pct: Decimal::new(10, 0),
            hours: Some(hours),
            requires_smart_meter: false,
            delta_vs_mean_pct: Decimal::new(-25, 1),
            basis: ChoiceBasis::PreferredHours,
            next_steps: vec![
                NextStep::ContactVendor {
                    vendor: "Basic Power".to_owned(),
                    plan: "Evening Basic".to_owned(),
                },
                NextStep::NoSmartMeterNeeded,
                NextStep::ShiftUsageToDiscountHours { hours },
            ],
        }
    }

    #[test]
    fn locales_define_exactly_the_required_templates() {
        for locale in Locale::ALL {
            assert_eq!(locale_templates(locale).len(), REQUIRED_TEMPLATES.len(), "{locale}");
        }
        assert_eq!(catalog(Locale::En).template_count(), REQUIRED_TEMPLATES.len() * 2);
    }

    #[test]
    fn every_template_renders_in_every_locale() {
        for locale in Locale::ALL {
            assert_eq!(catalog(locale).verify().expect("verify"), REQUIRED_TEMPLATES.len());
        }
    }

    #[test]
    fn english_recommendation_matches_reference_layout() {
        let text = catalog(Locale::En).recommendation_text(&evening_summary()).expect("render");

        assert!(text.starts_with("✅ *Recommended Provider: Basic Power - Evening Basic*"));
        assert!(text.contains("- Discount: 10.0%"));
        assert!(text.contains("- Hours: 18:00-22:00"));
        assert!(text.contains("- Smart Meter Required: No"));
        assert!(text.contains("- Best discount during your preferred hours: 10.0% (18:00-22:00)"));
        assert!(text.contains("- Compared to average: -2.5%"));
        assert!(text.contains("- Contact Basic Power to sign up for the 'Evening Basic' plan"));
        assert!(text.ends_with("- Optimize your usage during discount hours (18:00-22:00)"));
    }

    #[test]
    fn above_mean_plans_say_better_than_average() {
        let mut summary = evening_summary();
        summary.delta_vs_mean_pct = Decimal::new(25, 1);
        let text = catalog(Locale::En).recommendation_text(&summary).expect("render");
        assert!(text.contains("- Better than average by 2.5%"));
    }

    #[test]
    fn hebrew_catalog_renders_hebrew_text() {
        let messages = catalog(Locale::He);
        let text = messages.recommendation_text(&evening_summary()).expect("render");
        assert!(text.contains("ספק מומלץ: Basic Power - Evening Basic"));
        assert!(text.contains("לא נדרש שעון חכם"));

        let question = messages.question(Question::SmartMeter).expect("question");
        assert!(question.fallback_text.contains("שעון חכם"));
        let labels: Vec<_> = question.buttons().map(|button| button.text.text().to_owned()).collect();
        assert_eq!(labels, vec!["כן", "לא"]);
    }

    #[test]
    fn questions_and_rejections_render_in_english() {
        let messages = catalog(Locale::En);
        let question = messages.question(Question::SmartMeter).expect("question");
        assert!(question.fallback_text.contains("smart meter"));

        let priority = messages.question(Question::Priority).expect("priority");
        assert!(priority.fallback_text.contains("important"));
        assert_eq!(priority.buttons().count(), 2);

        let rejection = messages.rejection(Rejection::InvalidHour).expect("rejection");
        assert_eq!(rejection.fallback_text, "Please enter a valid hour between 0 and 23.");
    }

    #[test]
    fn localized_answers_map_to_canonical_tokens() {
        let messages = catalog(Locale::En);
        assert_eq!(messages.canonical_answer(Question::SmartMeter, " כן "), "yes");
        assert_eq!(messages.canonical_answer(Question::SmartMeter, "לא"), "no");
        assert_eq!(messages.canonical_answer(Question::MinDiscount, "None"), "");
        assert_eq!(messages.canonical_answer(Question::MinDiscount, "ללא"), "");
        assert_eq!(messages.canonical_answer(Question::Priority, "Specific hours"), "2");
        assert_eq!(messages.canonical_answer(Question::DiscountStart, " 18 "), "18");
        assert_eq!(messages.canonical_answer(Question::DiscountStart, "none"), "none");
    }

    #[test]
    fn unknown_command_names_the_command() {
        let message = catalog(Locale::En).unknown_command("quote").expect("render");
        assert!(message.fallback_text.contains("/quote"));
    }
}
