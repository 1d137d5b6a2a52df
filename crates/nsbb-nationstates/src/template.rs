//! Registration form fragment for the plugin's fields.

use crate::fields::{CHECKSUM_FIELD, NATION_FIELD};
use nsbb_plugin::form::render_horizontal_field;
use nsbb_plugin::RegistrationForm;

/// Renders the nation and verification-code fields, or `None` if the form
/// does not carry them.
pub fn registration_fields_html(form: &RegistrationForm) -> Option<String> {
    let nation = form.field(NATION_FIELD)?;
    let checksum = form.field(CHECKSUM_FIELD)?;
    let mut html = render_horizontal_field(nation);
    html.push_str(&render_horizontal_field(checksum));
    Some(html)
}
