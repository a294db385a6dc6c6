//! Label Templates - print configuration and the saved-template library

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::{JsonFile, StateDir, StoreError, LABEL_TEMPLATES_KEY};

pub type TemplateId = String;

pub const MAX_SAVED_TEMPLATES: usize = 10;
pub const MAX_TEMPLATE_NAME_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Closed set of label layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelTemplate {
    Icon,
    #[default]
    Standard,
    Full,
    #[serde(rename = "qrcode")]
    QrCode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameDisplay {
    #[default]
    Both,
    En,
    Zh,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    #[serde(default)]
    pub size: LabelSize,
    #[serde(default)]
    pub template: LabelTemplate,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub name_display: NameDisplay,
}

/// Free-text fields printed on every label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFields {
    #[serde(default)]
    pub lab_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub batch_number: Option<String>,
}

impl CustomFields {
    /// Non-blank fields in print order, as (label, value).
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Lab", self.lab_name.as_deref()),
            ("Date", self.date.as_deref()),
            ("Batch", self.batch_number.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTemplate {
    pub id: TemplateId,
    pub name: String,
    pub config: LabelConfig,
    #[serde(default)]
    pub custom_fields: CustomFields,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template name must not be blank")]
    EmptyName,

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Saved-template library - newest first, capped
pub struct TemplateLibrary {
    file: JsonFile<Vec<SavedTemplate>>,
    templates: Vec<SavedTemplate>,
}

impl TemplateLibrary {
    pub fn open(state: &StateDir) -> Self {
        let file = state.file(LABEL_TEMPLATES_KEY);
        let mut templates: Vec<SavedTemplate> = file.load();
        templates.truncate(MAX_SAVED_TEMPLATES);
        Self { file, templates }
    }

    pub fn list(&self) -> &[SavedTemplate] {
        &self.templates
    }

    /// Look up by id, falling back to an exact name match.
    pub fn get(&self, key: &str) -> Option<&SavedTemplate> {
        self.templates
            .iter()
            .find(|t| t.id == key)
            .or_else(|| self.templates.iter().find(|t| t.name == key))
    }

    pub fn save(
        &mut self,
        name: &str,
        config: LabelConfig,
        custom_fields: CustomFields,
    ) -> Result<&SavedTemplate, TemplateError> {
        let name: String = name.trim().chars().take(MAX_TEMPLATE_NAME_CHARS).collect();
        if name.is_empty() {
            return Err(TemplateError::EmptyName);
        }

        let mut next = self.templates.clone();
        next.insert(
            0,
            SavedTemplate {
                id: Uuid::new_v4().to_string(),
                name,
                config,
                custom_fields,
                created_at: Utc::now(),
            },
        );
        next.truncate(MAX_SAVED_TEMPLATES);
        self.file.save(&next)?;
        self.templates = next;
        Ok(&self.templates[0])
    }

    pub fn delete(&mut self, id: &str) -> Result<(), TemplateError> {
        let pos = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;
        let mut next = self.templates.clone();
        next.remove(pos);
        self.file.save(&next)?;
        self.templates = next;
        Ok(())
    }
}
