//! Bot self-identity: who we are on the messaging platform, so inbound
//! deliveries authored by the bot itself can be dropped and @-mentions
//! of the bot's name can be stripped from message text.

use diana_providers::PersonProfile;

#[derive(Debug, Clone, Default)]
pub struct BotIdentity {
    pub id: String,
    /// Display name with the platform's "(bot)" suffix removed.
    pub name: String,
    /// First word of the name, when the name has more than one word.
    pub short_name: String,
    pub emails: Vec<String>,
    /// Email domain the platform assigns to bot accounts.
    pub email_domain: String,
}

impl BotIdentity {
    pub fn from_profile(profile: &PersonProfile, email_domain: &str) -> Self {
        let name = profile
            .display_name
            .as_deref()
            .unwrap_or_default()
            .replace("(bot)", "")
            .trim()
            .to_owned();

        let short_name = match name.split_once(' ') {
            Some((first, _)) => first.to_owned(),
            None => String::new(),
        };

        Self {
            id: profile.id.clone(),
            name,
            short_name,
            emails: profile.emails.clone(),
            email_domain: email_domain.to_owned(),
        }
    }

    /// Fallback identity when the profile could not be loaded; the domain
    /// suffix check still filters most self-authored traffic.
    pub fn with_domain(email_domain: &str) -> Self {
        Self {
            email_domain: email_domain.to_owned(),
            ..Self::default()
        }
    }

    /// Whether a delivery was authored by the bot account itself.
    pub fn is_self(&self, person_id: Option<&str>, person_email: Option<&str>) -> bool {
        if let Some(email) = person_email {
            if email.ends_with(&format!("@{}", self.email_domain)) {
                return true;
            }
            if self.emails.iter().any(|e| e == email) {
                return true;
            }
        }

        match person_id {
            Some(id) => !self.id.is_empty() && id == self.id,
            None => false,
        }
    }

    /// Remove the first occurrence of the bot's name (and short name) from
    /// a message, the way the platform renders @-mentions as plain text.
    pub fn strip_mention(&self, text: &str) -> String {
        let mut result = text.to_owned();
        if !self.name.is_empty() {
            result = result.replacen(&self.name, "", 1);
        }
        if !self.short_name.is_empty() {
            result = result.replacen(&self.short_name, "", 1);
        }
        result
    }
}
