use std::collections::{BTreeMap, BTreeSet};

use mia_core::{
    CheckboxOption, ChoiceOption, FieldKind, FieldValue, FormField, RawResponse, ResponseSpec,
    ScriptNode, ValidationError,
};

pub const DEFAULT_SUBMIT_LABEL: &str = "Submitted";

/// Typed view of an accepted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Choice(String),
    Checkboxes(Vec<String>),
    /// Field name to trimmed values; blank optional fields are absent.
    Form(BTreeMap<String, Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedResponse {
    pub node_id: String,
    /// Payload exactly as submitted; this is what history records.
    pub response: RawResponse,
    pub answer: Answer,
    pub echo: String,
}

pub fn validate(node: &ScriptNode, raw: &RawResponse) -> Result<ValidatedResponse, ValidationError> {
    let spec = match &node.response_spec {
        Some(spec) if !node.terminal => spec,
        _ => {
            return Err(ValidationError::UnexpectedResponse {
                node_id: node.id.clone(),
            })
        }
    };

    let (answer, echo) = match (spec, raw) {
        (ResponseSpec::ChoiceList { choices }, RawResponse::Choice(choice)) => {
            validate_choice(&node.id, choices, choice)?
        }
        (ResponseSpec::CheckboxGroup { options }, RawResponse::Selection(names)) => {
            validate_checkboxes(&node.id, options, names)?
        }
        (
            ResponseSpec::StructuredForm {
                fields,
                submit_label,
            },
            RawResponse::Form(values),
        ) => {
            let answer = validate_form(&node.id, fields, values)?;
            let echo = submit_label
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBMIT_LABEL.to_string());
            (answer, echo)
        }
        (spec, raw) => {
            return Err(ValidationError::ShapeMismatch {
                node_id: node.id.clone(),
                expected: expected_shape(spec),
                actual: raw.shape_name(),
            })
        }
    };

    Ok(ValidatedResponse {
        node_id: node.id.clone(),
        response: raw.clone(),
        answer,
        echo,
    })
}

fn expected_shape(spec: &ResponseSpec) -> &'static str {
    match spec {
        ResponseSpec::ChoiceList { .. } => "choice",
        ResponseSpec::CheckboxGroup { .. } => "selection",
        ResponseSpec::StructuredForm { .. } => "form",
    }
}

fn validate_choice(
    node_id: &str,
    choices: &[ChoiceOption],
    choice: &str,
) -> Result<(Answer, String), ValidationError> {
    let selected = choices
        .iter()
        .find(|option| option.id == choice)
        .ok_or_else(|| ValidationError::InvalidChoice {
            node_id: node_id.to_string(),
            choice: choice.to_string(),
        })?;
    Ok((Answer::Choice(selected.id.clone()), selected.label.clone()))
}

fn validate_checkboxes(
    node_id: &str,
    options: &[CheckboxOption],
    names: &[String],
) -> Result<(Answer, String), ValidationError> {
    if names.is_empty() {
        return Err(ValidationError::EmptySelection {
            node_id: node_id.to_string(),
        });
    }
    if let Some(unknown) = names
        .iter()
        .find(|name| !options.iter().any(|option| &option.name == *name))
    {
        return Err(ValidationError::InvalidOption {
            node_id: node_id.to_string(),
            field: "checkbox_group".to_string(),
            value: unknown.clone(),
        });
    }
    if let Some(repeated) = first_repeat(names.iter().map(String::as_str)) {
        return Err(ValidationError::InvalidOption {
            node_id: node_id.to_string(),
            field: "checkbox_group".to_string(),
            value: repeated.to_string(),
        });
    }

    let checked: Vec<&CheckboxOption> = options
        .iter()
        .filter(|option| names.contains(&option.name))
        .collect();
    let echo = checked
        .iter()
        .map(|option| option.label.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let answer = Answer::Checkboxes(checked.iter().map(|option| option.name.clone()).collect());
    Ok((answer, echo))
}

fn validate_form(
    node_id: &str,
    fields: &[FormField],
    values: &BTreeMap<String, FieldValue>,
) -> Result<Answer, ValidationError> {
    if let Some(unknown) = values
        .keys()
        .find(|name| !fields.iter().any(|field| &field.name == *name))
    {
        return Err(ValidationError::UnknownField {
            node_id: node_id.to_string(),
            field: unknown.clone(),
        });
    }

    let mut accepted = BTreeMap::new();
    for field in fields {
        let value = match values.get(&field.name) {
            Some(value) if !value.is_blank() => value,
            _ if field.required => {
                return Err(ValidationError::MissingField {
                    node_id: node_id.to_string(),
                    field: field.name.clone(),
                })
            }
            _ => continue,
        };
        accepted.insert(field.name.clone(), validate_field(node_id, field, value)?);
    }
    Ok(Answer::Form(accepted))
}

fn validate_field(
    node_id: &str,
    field: &FormField,
    value: &FieldValue,
) -> Result<Vec<String>, ValidationError> {
    let invalid = |value: &str| ValidationError::InvalidOption {
        node_id: node_id.to_string(),
        field: field.name.clone(),
        value: value.to_string(),
    };

    match field.kind {
        FieldKind::Text | FieldKind::Radio | FieldKind::Select => {
            let single = match value {
                FieldValue::Text(text) => text.trim(),
                FieldValue::Many(items) if items.len() == 1 => items[0].trim(),
                FieldValue::Many(items) => return Err(invalid(&items.join(", "))),
            };
            if field.kind != FieldKind::Text && !field.has_option(single) {
                return Err(invalid(single));
            }
            Ok(vec![single.to_string()])
        }
        FieldKind::CheckboxGroup => {
            let picked: Vec<&str> = value
                .values()
                .into_iter()
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect();
            if let Some(unknown) = picked.iter().find(|item| !field.has_option(item)) {
                return Err(invalid(unknown));
            }
            if let Some(repeated) = first_repeat(picked.iter().copied()) {
                return Err(invalid(repeated));
            }
            Ok(field
                .options
                .iter()
                .filter(|option| picked.contains(&option.value.as_str()))
                .map(|option| option.value.clone())
                .collect())
        }
    }
}

/// First value that appears more than once.
fn first_repeat<'a>(items: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = BTreeSet::new();
    items.into_iter().find(|item| !seen.insert(*item))
}
