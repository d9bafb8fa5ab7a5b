// Shared prompt fragments. Each strategy in `extraction` builds its own
// prompt and pulls the cross-cutting pieces from here.

/// Instruction that enforces JSON-only output. Used by both strategies.
pub const JSON_ONLY_INSTRUCTION: &str = "Return ONLY a valid JSON object, \
    without any additional text or explanations.";

/// Reminder appended to chat system prompts: missing information stays null.
pub const NULL_WHEN_ABSENT: &str = "If a field is not mentioned in the text, \
    set it to null. Do not invent information.";
