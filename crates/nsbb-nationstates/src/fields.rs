//! Registration fields: nation name and verification code.

use crate::pending::PendingAssignments;
use crate::verify::NsApiClient;
use async_trait::async_trait;
use nsbb_markup::escape_html;
use nsbb_plugin::form::{AllowedChars, FieldValidator, Required, ValidationError};
use nsbb_plugin::{FormField, RegistrationForm};

/// Host field holding the username the pending entry is keyed by.
pub const USERNAME_FIELD: &str = "username";
pub const NATION_FIELD: &str = "nation";
pub const CHECKSUM_FIELD: &str = "nation_checksum";

pub const NATION_REQUIRED: &str = "A NationStates nation is required to register";
pub const CHECKSUM_REQUIRED: &str = "A code is required to verify your nation";
pub const INVALID_NATION_CHARS: &str = "Invalid characters in nation name";
pub const CODE_INCORRECT: &str = "Code incorrect";

/// Letters, digits, underscore, space and hyphen.
pub fn is_nation_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-')
}

pub fn nation_name_validator() -> AllowedChars {
    AllowedChars::new(is_nation_name_char, INVALID_NATION_CHARS)
}

/// Validates the verification code against the API and records the outcome
/// in the pending table.
///
/// API failures never block registration: they are logged and the user is
/// recorded as having no nation. A code the API rejects fails validation and
/// records nothing. If the nation field already failed, no request is made.
#[derive(Debug, Clone)]
pub struct ChecksumVerifier {
    client: NsApiClient,
    pending: PendingAssignments,
}

impl ChecksumVerifier {
    pub fn new(client: NsApiClient, pending: PendingAssignments) -> Self {
        Self { client, pending }
    }
}

#[async_trait]
impl FieldValidator for ChecksumVerifier {
    async fn validate(
        &self,
        form: &RegistrationForm,
        field: &FormField,
    ) -> Result<(), ValidationError> {
        let Some(nation_field) = form.field(NATION_FIELD) else {
            return Ok(());
        };
        if nation_field.has_errors() {
            return Ok(());
        }

        let nation = nation_field.value.as_str();
        let username = form.value(USERNAME_FIELD).unwrap_or_default();

        match self.client.verify(nation, &field.value).await {
            Ok(true) => {
                tracing::debug!(username, nation, "nation verified");
                self.pending
                    .record(username, form.submission(), Some(nation.to_string()));
                Ok(())
            }
            Ok(false) => Err(ValidationError::new(CODE_INCORRECT)),
            Err(e) => {
                tracing::error!(username, nation, error = %e, "error verifying nation");
                self.pending.record(username, form.submission(), None);
                Ok(())
            }
        }
    }
}

/// The two fields this plugin adds to the registration form.
pub fn nation_fields(
    client: NsApiClient,
    pending: PendingAssignments,
    verify_page_url: &str,
) -> [FormField; 2] {
    let nation = FormField::new(NATION_FIELD, "Nation name")
        .validator(Required::new(NATION_REQUIRED))
        .validator(nation_name_validator());

    let checksum = FormField::new(CHECKSUM_FIELD, "Verification code")
        .description_html(format!(
            "Get your code from <a href=\"{}\">this page</a>",
            escape_html(verify_page_url)
        ))
        .placeholder("Verification code")
        .validator(Required::new(CHECKSUM_REQUIRED))
        .validator(ChecksumVerifier::new(client, pending));

    [nation, checksum]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nation_charset() {
        let v = nation_name_validator();
        for name in ["Testlandia", "great_britain", "The Far-Away Isles", "a", "1999"] {
            assert!(v.matches(name), "{name} should be accepted");
        }
        for name in ["", "Test.landia", "<script>", "Ünited", "tab\there", "semi;colon"] {
            assert!(!v.matches(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn every_ascii_char_outside_the_class_is_rejected() {
        let v = nation_name_validator();
        for byte in 0u8..128 {
            let c = char::from(byte);
            let expected = c.is_ascii_alphanumeric() || c == '_' || c == ' ' || c == '-';
            assert_eq!(v.matches(&format!("ok{c}")), expected, "char {byte}");
        }
    }
}
