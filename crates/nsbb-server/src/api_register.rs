//! Registration: the host's `username` field plus every plugin's fields.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use async_trait::async_trait;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::Html,
};
use nsbb_db::DbPool;
use nsbb_plugin::form::{
    render_horizontal_field, FieldValidator, Length, Required, ValidationError,
};
use nsbb_plugin::{FormField, RegistrationForm};
use nsbb_types::User;
use std::collections::HashMap;
use std::sync::Arc;

pub const USERNAME_FIELD: &str = "username";
pub const USERNAME_REQUIRED: &str = "A username is required";
pub const USERNAME_TAKEN: &str = "Username already taken";

/// Rejects usernames that already have an account.
struct UniqueUsername {
    pool: DbPool,
}

#[async_trait]
impl FieldValidator for UniqueUsername {
    async fn validate(
        &self,
        _form: &RegistrationForm,
        field: &FormField,
    ) -> Result<(), ValidationError> {
        let pool = self.pool.clone();
        let username = field.value.clone();
        let taken = tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| e.to_string())?;
            nsbb_db::get_user_by_username(&conn, &username)
                .map(|user| user.is_some())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| e.to_string())
        .and_then(|result| result);

        match taken {
            Ok(true) => Err(ValidationError::new(USERNAME_TAKEN)),
            Ok(false) => Ok(()),
            Err(e) => {
                // The insert still enforces uniqueness.
                tracing::warn!(error = %e, "username availability check failed");
                Ok(())
            }
        }
    }
}

/// Builds the full registration form: host fields first, then plugins.
pub fn registration_form(state: &AppState) -> RegistrationForm {
    let mut form = RegistrationForm::new();
    form.add_field(
        FormField::new(USERNAME_FIELD, "Username")
            .validator(Required::new(USERNAME_REQUIRED))
            .validator(Length::new(3, 25))
            .validator(UniqueUsername {
                pool: state.pool.clone(),
            }),
    );
    state.plugins.extend_registration_form(&mut form);
    form
}

fn render_registration_page(state: &AppState, form: &RegistrationForm) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>Register</title></head>\n<body>\n\
         <form class=\"form-horizontal\" method=\"post\" action=\"/api/register\">\n",
    );
    if let Some(username) = form.field(USERNAME_FIELD) {
        html.push_str(&render_horizontal_field(username));
    }
    html.push_str(&state.plugins.registration_form_fragments(form));
    html.push_str(
        "<div class=\"form-group row\">\n    <div class=\"col-sm-offset-3 col-sm-4\">\n        \
         <button class=\"btn btn-primary\" type=\"submit\">Register</button>\n    </div>\n</div>\n\
         </form>\n</body>\n</html>\n",
    );
    html
}

/// Handler for `GET /register`.
pub async fn registration_page_handler(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    let form = registration_form(&state);
    Html(render_registration_page(&state, &form))
}

/// Handler for `POST /api/register`.
///
/// Validates the form, commits the user, then fires the
/// registration-completed event. The user row stays committed if a plugin
/// hook fails afterwards.
pub async fn register_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(values): Json<HashMap<String, String>>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let mut form = registration_form(&state);
    form.fill(&values);
    let username = form.value(USERNAME_FIELD).unwrap_or_default().to_string();
    let submission = form.submission();

    if !form.validate().await {
        tracing::debug!(
            username = %username,
            %submission,
            errors = ?form.errors(),
            "registration rejected"
        );
        state.plugins.registration_rejected(&username, submission);
        return Err(ApiError::Validation(form.errors()));
    }

    let user = with_conn(state, move |state, conn| {
        let user = match nsbb_db::create_user(conn, &username) {
            Ok(user) => user,
            Err(e) => {
                state.plugins.registration_rejected(&username, submission);
                return Err(e.into());
            }
        };
        tracing::info!(user_id = user.id, username = %user.username, "registered user");

        state.plugins.user_registered(conn, &user.username, submission)?;
        Ok(user)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
