use inquire::autocompletion::Replacement;
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::validator::Validation;
use inquire::{
    set_global_render_config, Autocomplete, Confirm, CustomUserError, Editor, Password,
    PasswordDisplayMode, Select, Text,
};

use crate::error::Error;

/// Initialize the global render configuration for inquire prompts
pub fn init_render_config() {
    let mut style = RenderConfig::default_colored();
    style.prompt_prefix = Styled::new(">").with_fg(Color::LightGreen);
    set_global_render_config(style);
}

/// Prompt for a required text value, optionally pre-filled with a default
pub fn prompt_text(message: &str, default: Option<&str>) -> Result<String, Error> {
    let mut prompt = Text::new(message).with_validator(required);
    if let Some(default) = default {
        prompt = prompt.with_default(default);
    }
    prompt.prompt().map_err(map_inquire_error)
}

/// Prompt for a text value where an empty answer is acceptable
pub fn prompt_optional(message: &str) -> Result<String, Error> {
    Text::new(message)
        .prompt()
        .map(|answer| answer.trim().to_string())
        .map_err(map_inquire_error)
}

/// Prompt for a masked password
pub fn prompt_password(message: &str) -> Result<String, Error> {
    Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .map_err(map_inquire_error)
}

/// Prompt for a numeric id, optionally pre-filled with a default
pub fn prompt_u32(message: &str, default: Option<u32>) -> Result<u32, Error> {
    let default = default.map(|value| value.to_string());

    let mut prompt = Text::new(message).with_validator(numeric);
    if let Some(default) = &default {
        prompt = prompt.with_default(default);
    }

    let answer = prompt.prompt().map_err(map_inquire_error)?;
    answer
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{:?} is not a numeric id", answer)))
}

/// Prompt for a selection from a fixed list, with the cursor starting on
/// the default option when one is given
pub fn prompt_select(
    message: &str,
    options: Vec<String>,
    default: Option<&str>,
) -> Result<String, Error> {
    let start = default
        .and_then(|default| options.iter().position(|option| option == default))
        .unwrap_or(0);

    Select::new(message, options)
        .with_starting_cursor(start)
        .prompt()
        .map_err(map_inquire_error)
}

/// Prompt for a text value with autocomplete suggestions. Free entry is
/// allowed; the suggestions only guide the operator.
pub fn prompt_search(message: &str, options: Vec<String>) -> Result<String, Error> {
    Text::new(message)
        .with_autocomplete(Choices::new(options))
        .with_validator(required)
        .prompt()
        .map_err(map_inquire_error)
}

/// Prompt for a longer text using an editor
pub fn prompt_editor(message: &str) -> Result<String, Error> {
    Editor::new(message)
        .with_formatter(&|x| x.to_string())
        .prompt()
        .map_err(map_inquire_error)
}

/// Ask a yes/no question
pub fn prompt_confirm(message: &str, default: bool) -> Result<bool, Error> {
    Confirm::new(message)
        .with_default(default)
        .prompt()
        .map_err(map_inquire_error)
}

/// A fixed set of completion candidates for text prompts
#[derive(Debug, Clone)]
pub struct Choices {
    items: Vec<String>,
}

impl Choices {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }
}

impl Autocomplete for Choices {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        let needle = input.to_lowercase();
        let mut suggestions = Vec::new();
        for item in self.items.iter() {
            if item.to_lowercase().contains(&needle) {
                suggestions.push(item.clone());
            }
        }
        Ok(suggestions)
    }

    fn get_completion(
        &mut self,
        input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        if highlighted_suggestion.is_some() {
            return Ok(highlighted_suggestion);
        }
        for item in self.items.iter() {
            if item.starts_with(input) {
                return Ok(Some(item.clone()));
            }
        }
        Ok(None)
    }
}

fn required(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("A value is required".into()))
    } else {
        Ok(Validation::Valid)
    }
}

fn numeric(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().parse::<u32>().is_ok() {
        Ok(Validation::Valid)
    } else {
        Ok(Validation::Invalid("Enter a numeric id".into()))
    }
}

/// Map inquire errors to our error type
fn map_inquire_error(err: InquireError) -> Error {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => Error::Cancelled,
        _ => Error::Prompt(err.to_string()),
    }
}
