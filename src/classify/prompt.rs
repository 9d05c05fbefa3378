//! Classification prompt construction.

use super::types::EmailInput;

/// Characters of body text included in the prompt.
pub const MAX_BODY_CHARS: usize = 1000;

/// The textual fields the prompt is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct PromptFields<'a> {
    pub subject: &'a str,
    pub from: &'a str,
    pub body: &'a str,
    pub snippet: &'a str,
}

impl<'a> PromptFields<'a> {
    /// Fields for an email, with defaults applied for anything missing.
    pub fn from_email(email: &'a EmailInput) -> Self {
        Self {
            subject: email.subject_or_default(),
            from: email.from_or_default(),
            body: email.body_or_default(),
            snippet: email.snippet_or_default(),
        }
    }

    /// Body if present, else snippet, cut to `MAX_BODY_CHARS` characters.
    pub fn effective_body(&self) -> &'a str {
        let text = if !self.body.is_empty() {
            self.body
        } else {
            self.snippet
        };
        match text.char_indices().nth(MAX_BODY_CHARS) {
            Some((cut, _)) => &text[..cut],
            None => text,
        }
    }
}

const PREAMBLE: &str = "You are an expert email classifier. Analyze the following email and classify it into ONE of these categories:

Categories:
1. Important: Personal or work-related emails requiring immediate attention (urgent, time-sensitive, from important contacts)
2. Promotions: Sales, discounts, special offers, and marketing campaigns
3. Social: Emails from social networks, friends, family, and personal connections
4. Marketing: Marketing newsletters, notifications, and informational emails
5. Spam: Unwanted, unsolicited, or suspicious emails
6. General: Emails that don't fit the above categories";

const CLOSING: &str = r#"Respond ONLY with a valid JSON object (no markdown, no extra text):
{
  "category": "CategoryName",
  "confidence": 0.95,
  "reasoning": "Brief explanation of why this email was classified this way"
}

Remember:
- confidence should be a number between 0 and 1
- category must be exactly one of: Important, Promotions, Social, Marketing, Spam, General
- Keep reasoning concise (1-2 sentences)"#;

/// Render the classification prompt for one email.
pub fn build_classification_prompt(fields: &PromptFields<'_>) -> String {
    let body = fields.effective_body();
    let mut prompt = String::with_capacity(PREAMBLE.len() + CLOSING.len() + body.len() + 128);

    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\nEmail Details:\n");
    prompt.push_str(&format!("From: {}\n", fields.from));
    prompt.push_str(&format!("Subject: {}\n", fields.subject));
    prompt.push_str(&format!("Body: {}\n\n", body));
    prompt.push_str(CLOSING);

    prompt
}
