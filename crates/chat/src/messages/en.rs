use voltwiz_core::flows::Question;

pub(super) const TEMPLATES: &[(&str, &str)] = &[
    (
        "welcome",
        "Welcome to the Electricity Provider Recommendation Bot! Let's find the best plan for you.",
    ),
    (
        "help",
        "I'll help you find the electricity plan that fits you best.\n\
         I'll ask a few short questions to understand your needs.\n\n\
         Available commands:\n\
         /start - start a new conversation\n\
         /help - show this help\n\
         /reset - reset the current conversation",
    ),
    ("reset", "Your conversation has been reset. Let's start again!"),
    ("restart_hint", "To start over, just send 'hi' or 'start'."),
    (
        "completed",
        "You already have your recommendation. To start over, just send 'hi' or 'start'.",
    ),
    (
        "no_plan",
        "Sorry, we couldn't find any suitable providers based on your requirements.",
    ),
    (
        "error",
        "Sorry, something went wrong. Please try again or send /reset to start over.",
    ),
    ("unknown_command", "Unknown command /{{ name }}. Send /help to see what I can do."),
    ("question.smart_meter", "Do you have (or can install) a smart meter? (yes/no)"),
    (
        "question.priority",
        "What's most important to you?\n1) Highest % discount\n2) Discount during specific hours\nEnter 1 or 2:",
    ),
    ("question.discount_start", "What hour would you like your discount to start? (0-23)"),
    ("question.discount_end", "What hour would you like your discount to end? (0-23)"),
    (
        "question.min_discount",
        "What is your minimum acceptable discount percentage? (e.g., 10)\nSend 'none' for no minimum.",
    ),
    ("choice.yes", "Yes"),
    ("choice.no", "No"),
    ("choice.max_discount", "Highest % discount"),
    ("choice.time_specific", "Specific hours"),
    ("choice.no_minimum", "No minimum"),
    ("choice.restart", "Start over"),
    (
        "rejection.expected_yes_no",
        "I didn't understand that. Please answer 'yes' or 'no' if you have a smart meter.",
    ),
    (
        "rejection.expected_priority_choice",
        "Please enter either 1 (for highest discount) or 2 (for time-specific discount).",
    ),
    ("rejection.invalid_hour", "Please enter a valid hour between 0 and 23."),
    ("rejection.negative_discount", "Minimum discount percentage cannot be negative."),
    ("rejection.discount_above_maximum", "Discount percentage cannot exceed 100%."),
    (
        "rejection.invalid_discount",
        "Please enter a valid discount percentage (e.g., 10) or send 'none' for no minimum.",
    ),
    (
        "rejection.no_pending_question",
        "There is no question waiting for an answer. Send 'start' to begin.",
    ),
    ("hours.all_day", "All day"),
    ("step.contact_vendor", "Contact {{ vendor }} to sign up for the '{{ plan }}' plan"),
    ("step.install_smart_meter", "Make sure to install a smart meter"),
    ("step.no_smart_meter_needed", "No smart meter required"),
    ("step.shift_usage", "Optimize your usage during discount hours ({{ hours }})"),
    ("step.enjoy_all_day", "Enjoy discounts all day"),
    (
        "recommendation",
        "✅ *Recommended Provider: {{ vendor }} - {{ plan_name }}*

📊 *Plan Details:*
- Discount: {{ discount }}%
- Hours: {{ hours }}
- Smart Meter Required: {% if requires_smart_meter %}Yes{% else %}No{% endif %}

💰 *Why This Plan:*
{% if basis == \"highest_discount\" %}- Best discount percentage: {{ discount }}%{% else %}- Best discount during your preferred hours: {{ discount }}% ({{ hours }}){% endif %}
{% if above_mean %}- Better than average by {{ delta_abs }}%{% else %}- Compared to average: {{ delta }}%{% endif %}

ℹ️ *Next Steps:*
{% for step in next_steps %}- {{ step }}
{% endfor %}",
    ),
];

/// Free-text replies mapped onto the tokens the answer parser accepts.
pub(super) const ANSWER_ALIASES: &[(Question, &str, &str)] = &[
    (Question::MinDiscount, "none", ""),
    (Question::MinDiscount, "no minimum", ""),
    (Question::MinDiscount, "skip", ""),
    (Question::Priority, "highest % discount", "1"),
    (Question::Priority, "specific hours", "2"),
];
