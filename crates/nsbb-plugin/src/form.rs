//! Registration form model and field validators.
//!
//! Fields are validated in the order they were added; a field's validators
//! run in order, and each validator sees the whole form, including the
//! errors of fields validated before it. A validator can stop the chain for
//! its own field (see [`ValidationError::stop`]).

use async_trait::async_trait;
use nsbb_markup::escape_html;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A failed validation with a user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    /// Skip the remaining validators of this field.
    pub stop_chain: bool,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stop_chain: false,
        }
    }

    pub fn stop(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stop_chain: true,
        }
    }
}

/// Validates one field of a submitted form.
#[async_trait]
pub trait FieldValidator: Send + Sync {
    async fn validate(&self, form: &RegistrationForm, field: &FormField)
        -> Result<(), ValidationError>;
}

/// A single text field.
#[derive(Clone)]
pub struct FormField {
    pub name: String,
    pub label: String,
    /// Trusted HTML shown under the input.
    pub description_html: Option<String>,
    /// Defaults to the label when unset.
    pub placeholder: Option<String>,
    /// Submitted value, trimmed.
    pub value: String,
    pub errors: Vec<String>,
    validators: Vec<Arc<dyn FieldValidator>>,
}

impl fmt::Debug for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormField")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("value", &self.value)
            .field("errors", &self.errors)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl FormField {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description_html: None,
            placeholder: None,
            value: String::new(),
            errors: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn description_html(mut self, html: impl Into<String>) -> Self {
        self.description_html = Some(html.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Identifies one registration form instance, unique within the process.
///
/// Plugins key per-submission state by it so that concurrent registrations
/// for the same username do not see each other's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The registration form: host fields first, then plugin fields.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    fields: Vec<FormField>,
    submission: SubmissionId,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            submission: SubmissionId::next(),
        }
    }
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submission(&self) -> SubmissionId {
        self.submission
    }

    pub fn add_field(&mut self, field: FormField) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The submitted value of `name`, if the form has such a field.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }

    /// Copies submitted values into the fields. Missing values become empty.
    pub fn fill(&mut self, values: &HashMap<String, String>) {
        for field in &mut self.fields {
            field.value = values
                .get(&field.name)
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            field.errors.clear();
        }
    }

    /// Runs every validator and records errors. Returns whether the form is valid.
    pub async fn validate(&mut self) -> bool {
        for index in 0..self.fields.len() {
            let errors = self.run_validators(index).await;
            self.fields[index].errors = errors;
        }
        self.is_valid()
    }

    async fn run_validators(&self, index: usize) -> Vec<String> {
        let field = &self.fields[index];
        let mut errors = Vec::new();
        for validator in &field.validators {
            if let Err(e) = validator.validate(self, field).await {
                errors.push(e.message);
                if e.stop_chain {
                    break;
                }
            }
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|f| !f.has_errors())
    }

    /// Field name to messages, for fields that failed.
    pub fn errors(&self) -> BTreeMap<String, Vec<String>> {
        self.fields
            .iter()
            .filter(|f| f.has_errors())
            .map(|f| (f.name.clone(), f.errors.clone()))
            .collect()
    }
}

/// Fails (and stops the chain) when the value is empty.
#[derive(Debug, Clone)]
pub struct Required {
    message: String,
}

impl Required {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl FieldValidator for Required {
    async fn validate(
        &self,
        _form: &RegistrationForm,
        field: &FormField,
    ) -> Result<(), ValidationError> {
        if field.value.trim().is_empty() {
            return Err(ValidationError::stop(self.message.clone()));
        }
        Ok(())
    }
}

/// Bounds the value's length in characters.
#[derive(Debug, Clone)]
pub struct Length {
    min: usize,
    max: usize,
}

impl Length {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

#[async_trait]
impl FieldValidator for Length {
    async fn validate(
        &self,
        _form: &RegistrationForm,
        field: &FormField,
    ) -> Result<(), ValidationError> {
        let len = field.value.chars().count();
        if len < self.min || len > self.max {
            return Err(ValidationError::new(format!(
                "Field must be between {} and {} characters long.",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Requires a non-empty value made only of allowed characters.
#[derive(Debug, Clone)]
pub struct AllowedChars {
    allowed: fn(char) -> bool,
    message: String,
}

impl AllowedChars {
    pub fn new(allowed: fn(char) -> bool, message: impl Into<String>) -> Self {
        Self {
            allowed,
            message: message.into(),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        !value.is_empty() && value.chars().all(self.allowed)
    }
}

#[async_trait]
impl FieldValidator for AllowedChars {
    async fn validate(
        &self,
        _form: &RegistrationForm,
        field: &FormField,
    ) -> Result<(), ValidationError> {
        if self.matches(&field.value) {
            Ok(())
        } else {
            Err(ValidationError::new(self.message.clone()))
        }
    }
}

/// Renders a field as a Bootstrap horizontal form group.
pub fn render_horizontal_field(field: &FormField) -> String {
    let name = escape_html(&field.name);
    let label = escape_html(&field.label);
    let placeholder = escape_html(field.placeholder.as_deref().unwrap_or(&field.label));
    let mut html = String::new();

    let _ = writeln!(
        html,
        "<div class=\"form-group row{}\">",
        if field.has_errors() { " has-error" } else { "" }
    );
    let _ = writeln!(
        html,
        "    <label class=\"col-sm-3 control-label\" for=\"{name}\">{label}</label>"
    );
    html.push_str("    <div class=\"col-sm-4\">\n");
    let _ = writeln!(
        html,
        "        <input class=\"form-control\" id=\"{name}\" name=\"{name}\" placeholder=\"{placeholder}\" type=\"text\" value=\"{}\">",
        escape_html(&field.value)
    );
    if let Some(description) = &field.description_html {
        let _ = writeln!(html, "        <span class=\"help-block\">{description}</span>");
    }
    for error in &field.errors {
        let _ = writeln!(
            html,
            "        <span class=\"help-block\">{}</span>",
            escape_html(error)
        );
    }
    html.push_str("    </div>\n</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SeesEarlierErrors;

    #[async_trait]
    impl FieldValidator for SeesEarlierErrors {
        async fn validate(
            &self,
            form: &RegistrationForm,
            _field: &FormField,
        ) -> Result<(), ValidationError> {
            match form.field("first") {
                Some(first) if first.has_errors() => Err(ValidationError::new("first failed")),
                _ => Ok(()),
            }
        }
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn alnum(c: char) -> bool {
        c.is_ascii_alphanumeric()
    }

    #[tokio::test]
    async fn required_stops_the_chain() {
        let mut form = RegistrationForm::new();
        form.add_field(
            FormField::new("first", "First")
                .validator(Required::new("First is required"))
                .validator(AllowedChars::new(alnum, "Bad characters")),
        );
        form.fill(&values(&[("first", "   ")]));

        assert!(!form.validate().await);
        assert_eq!(
            form.errors().get("first"),
            Some(&vec!["First is required".to_string()])
        );
    }

    #[tokio::test]
    async fn non_stopping_errors_accumulate() {
        let mut form = RegistrationForm::new();
        form.add_field(
            FormField::new("first", "First")
                .validator(Length::new(5, 10))
                .validator(AllowedChars::new(alnum, "Bad characters")),
        );
        form.fill(&values(&[("first", "a!")]));

        assert!(!form.validate().await);
        assert_eq!(form.field("first").unwrap().errors.len(), 2);
    }

    #[tokio::test]
    async fn later_validators_see_earlier_field_errors() {
        let mut form = RegistrationForm::new();
        form.add_field(FormField::new("first", "First").validator(Required::new("required")));
        form.add_field(FormField::new("second", "Second").validator(SeesEarlierErrors));
        form.fill(&values(&[("second", "x")]));

        assert!(!form.validate().await);
        assert_eq!(
            form.errors().get("second"),
            Some(&vec!["first failed".to_string()])
        );

        form.fill(&values(&[("first", "ok"), ("second", "x")]));
        assert!(form.validate().await);
        assert!(form.errors().is_empty());
    }

    #[test]
    fn each_form_gets_its_own_submission() {
        let form = RegistrationForm::new();
        let other = RegistrationForm::new();
        assert_ne!(form.submission(), other.submission());
        assert_eq!(form.clone().submission(), form.submission());
    }

    #[test]
    fn fill_trims_and_defaults_missing_values() {
        let mut form = RegistrationForm::new();
        form.add_field(FormField::new("a", "A"));
        form.add_field(FormField::new("b", "B"));
        form.fill(&values(&[("a", "  alice \n")]));

        assert_eq!(form.value("a"), Some("alice"));
        assert_eq!(form.value("b"), Some(""));
        assert_eq!(form.value("c"), None);
    }

    #[test]
    fn allowed_chars_rejects_empty_values() {
        let v = AllowedChars::new(alnum, "bad");
        assert!(v.matches("abc123"));
        assert!(!v.matches(""));
        assert!(!v.matches("abc 123"));
    }

    #[test]
    fn horizontal_field_markup() {
        let mut field = FormField::new("nation", "Nation name")
            .description_html("<a href=\"/help\">help</a>");
        field.value = "\"Test\"".to_string();
        field.errors.push("Code <incorrect>".to_string());

        let html = render_horizontal_field(&field);
        assert!(html.starts_with("<div class=\"form-group row has-error\">"));
        assert!(html.contains("for=\"nation\">Nation name</label>"));
        assert!(html.contains("placeholder=\"Nation name\""));
        assert!(html.contains("value=\"&quot;Test&quot;\""));
        assert!(html.contains("<span class=\"help-block\"><a href=\"/help\">help</a></span>"));
        assert!(html.contains("<span class=\"help-block\">Code &lt;incorrect&gt;</span>"));
    }
}
