use voltwiz_core::flows::Question;

pub(super) const TEMPLATES: &[(&str, &str)] = &[
    (
        "welcome",
        "אני VoltWiz – היועץ החכם שלך לבחירת תכנית החשמל הכי משתלמת! ⚡️\n\
         בשיחה קצרה אני אכיר אותך ואמצא עבורך את החבילה שתעזור לך לחסוך הכי הרבה כסף, בדיוק לפי הסגנון שלך.\n\n\
         בלי כאבי ראש, בלי אותיות קטנות – רק המלצה ברורה, פשוטה ומדויקת.\n\
         יאללה, בוא נתחיל לחסוך 🙂",
    ),
    (
        "help",
        "אני בוט שיעזור לך למצוא את ספק החשמל המתאים ביותר עבורך.\n\
         אני אשאל אותך כמה שאלות קצרות כדי להבין את הצרכים שלך.\n\n\
         הפקודות הזמינות:\n\
         /start - התחל שיחה חדשה\n\
         /help - הצג עזרה\n\
         /reset - אפס את השיחה הנוכחית",
    ),
    ("reset", "השיחה אופסה. בוא נתחיל מחדש!"),
    ("restart_hint", "כדי להתחיל מחדש, פשוט שלחו /start."),
    ("completed", "כבר קיבלתם המלצה. כדי להתחיל מחדש, שלחו /start."),
    ("no_plan", "מצטערים, לא מצאנו ספקים מתאימים לדרישות שלך."),
    ("error", "מצטערים, אירעה שגיאה. אנא נסה שוב או השתמש ב /reset כדי להתחיל מחדש."),
    ("unknown_command", "פקודה לא מוכרת /{{ name }}. שלחו /help לרשימת הפקודות."),
    ("question.smart_meter", "האם יש לכם שעון חכם? (כן/לא)"),
    (
        "question.priority",
        "מה הכי חשוב לכם?\n1) אחוז ההנחה הגבוה ביותר\n2) הנחה בשעות מסוימות\nהקלידו 1 או 2:",
    ),
    ("question.discount_start", "באיזו שעה תרצו שההנחה תתחיל? (0-23)"),
    ("question.discount_end", "באיזו שעה תרצו שההנחה תסתיים? (0-23)"),
    (
        "question.min_discount",
        "מהו אחוז ההנחה המינימלי שמתאים לכם? (למשל 10)\nשלחו 'ללא' אם אין מינימום.",
    ),
    ("choice.yes", "כן"),
    ("choice.no", "לא"),
    ("choice.max_discount", "הנחה מקסימלית"),
    ("choice.time_specific", "שעות מסוימות"),
    ("choice.no_minimum", "ללא מינימום"),
    ("choice.restart", "להתחיל מחדש"),
    ("rejection.expected_yes_no", "לא הבנתי. אנא בחר 'כן' או 'לא'."),
    (
        "rejection.expected_priority_choice",
        "אנא הקלידו 1 (להנחה הגבוהה ביותר) או 2 (להנחה בשעות מסוימות).",
    ),
    ("rejection.invalid_hour", "אנא הזינו שעה תקינה בין 0 ל-23."),
    ("rejection.negative_discount", "אחוז ההנחה המינימלי לא יכול להיות שלילי."),
    ("rejection.discount_above_maximum", "אחוז ההנחה לא יכול לעלות על 100%."),
    ("rejection.invalid_discount", "אנא הזינו אחוז הנחה תקין (למשל 10) או 'ללא' אם אין מינימום."),
    ("rejection.no_pending_question", "אין כרגע שאלה פתוחה. שלחו /start כדי להתחיל."),
    ("hours.all_day", "כל היום"),
    ("step.contact_vendor", "פנו אל {{ vendor }} כדי להצטרף לתכנית '{{ plan }}'"),
    ("step.install_smart_meter", "ודאו שמותקן אצלכם שעון חכם"),
    ("step.no_smart_meter_needed", "לא נדרש שעון חכם"),
    ("step.shift_usage", "רכזו את הצריכה בשעות ההנחה ({{ hours }})"),
    ("step.enjoy_all_day", "תיהנו מהנחה לאורך כל היום"),
    (
        "recommendation",
        "✅ *ספק מומלץ: {{ vendor }} - {{ plan_name }}*

📊 *פרטי התכנית:*
- הנחה: {{ discount }}%
- שעות: {{ hours }}
- נדרש שעון חכם: {% if requires_smart_meter %}כן{% else %}לא{% endif %}

💰 *למה דווקא התכנית הזו:*
{% if basis == \"highest_discount\" %}- אחוז ההנחה הגבוה ביותר: {{ discount }}%{% else %}- ההנחה הטובה ביותר בשעות שבחרתם: {{ discount }}% ({{ hours }}){% endif %}
{% if above_mean %}- גבוהה מהממוצע ב-{{ delta_abs }}%{% else %}- בהשוואה לממוצע: {{ delta }}%{% endif %}

ℹ️ *הצעדים הבאים:*
{% for step in next_steps %}- {{ step }}
{% endfor %}",
    ),
];

pub(super) const ANSWER_ALIASES: &[(Question, &str, &str)] = &[
    (Question::SmartMeter, "כן", "yes"),
    (Question::SmartMeter, "לא", "no"),
    (Question::MinDiscount, "ללא", ""),
    (Question::MinDiscount, "אין", ""),
    (Question::MinDiscount, "ללא מינימום", ""),
    (Question::Priority, "הנחה מקסימלית", "1"),
    (Question::Priority, "שעות מסוימות", "2"),
];
