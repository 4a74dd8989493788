/*!
 * Content Dialog
 * Field sets, draft state and normalization for one content type at a time
 */
use serde::Serialize;
use serde_json::{Map, Value};
use std::{fmt, future::Future};
use uuid::Uuid;

use super::normalize::{
    clean_list, coerce_count, coerce_level, coerce_number, flag, optional_text, parse_date,
    long_text, slugify, text, Delimiter,
};
use super::{ContentType, Record};
use crate::db::models::{
    Blog, Contact, ContactStatus, Experience, GradientColor, Profile, Project, ProjectDetails,
    Skill, SkillCategory,
};
use crate::error::DialogError;

// ============================================================================
// Field sets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "options", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    LongText,
    Url,
    Date,
    Number,
    Flag,
    List(Delimiter),
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Dotted path into the draft, e.g. `details.challenge`
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required: false,
    }
}

const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required: true,
    }
}

const COMMA_LIST: FieldKind = FieldKind::List(Delimiter::Comma);
const LINE_LIST: FieldKind = FieldKind::List(Delimiter::Newline);

pub const COLOR_OPTIONS: &[&str] = &[
    "from-cyan-500 to-blue-500",
    "from-purple-500 to-pink-500",
    "from-green-500 to-teal-500",
    "from-orange-500 to-red-500",
    "from-indigo-500 to-violet-500",
    "from-yellow-500 to-amber-500",
];

pub const CATEGORY_OPTIONS: &[&str] = &[
    "Technical Skills",
    "Frameworks & Standards",
    "Security Tools",
    "Certifications",
];

pub const STATUS_OPTIONS: &[&str] = &["unread", "read", "replied"];

const PROFILE_FIELDS: &[FieldSpec] = &[
    required("name", "Name", FieldKind::Text),
    required("title", "Title", FieldKind::Text),
    required("bio", "Bio", FieldKind::LongText),
    field("avatar_url", "Avatar URL", FieldKind::Url),
    field("email", "Email", FieldKind::Text),
    field("years_of_experience", "Years of Experience", FieldKind::Number),
    field("companies", "Companies", FieldKind::Number),
    field("core_competencies", "Core Competencies", COMMA_LIST),
    field("specialized_skills", "Specialized Skills", COMMA_LIST),
    field("approach_text", "Approach", FieldKind::LongText),
    field("security_audits_count", "Security Audits", FieldKind::Number),
    field("vulnerabilities_count", "Vulnerabilities Patched", FieldKind::Number),
    field("architectures_count", "Security Architectures", FieldKind::Number),
    field("certifications_count", "Certifications", FieldKind::Number),
    field("github_url", "GitHub URL", FieldKind::Url),
    field("linkedin_url", "LinkedIn URL", FieldKind::Url),
    field("twitter_url", "Twitter URL", FieldKind::Url),
];

const PROJECT_FIELDS: &[FieldSpec] = &[
    required("title", "Title", FieldKind::Text),
    required("description", "Description", FieldKind::LongText),
    field("image_url", "Image URL", FieldKind::Url),
    field("github_url", "GitHub URL", FieldKind::Url),
    field("live_url", "Live URL", FieldKind::Url),
    field("tags", "Tags", COMMA_LIST),
    field("technologies", "Technologies", COMMA_LIST),
    field("details.challenge", "Challenge", FieldKind::LongText),
    field("details.solution", "Solution", FieldKind::LongText),
    field("details.technologies", "Technologies Used", COMMA_LIST),
    field("details.outcome", "Outcome", FieldKind::LongText),
    field("color", "Color", FieldKind::Choice(COLOR_OPTIONS)),
];

const EXPERIENCE_FIELDS: &[FieldSpec] = &[
    required("company", "Company", FieldKind::Text),
    required("position", "Position", FieldKind::Text),
    required("start_date", "Start Date", FieldKind::Date),
    field("end_date", "End Date", FieldKind::Date),
    field("current", "Current Position", FieldKind::Flag),
    field("mission", "Mission", FieldKind::LongText),
    field("achievements", "Achievements", LINE_LIST),
];

const SKILL_FIELDS: &[FieldSpec] = &[
    required("name", "Skill Name", FieldKind::Text),
    required("category", "Category", FieldKind::Choice(CATEGORY_OPTIONS)),
    field("level", "Level (%)", FieldKind::Number),
    field("icon", "Icon", FieldKind::Text),
];

const CONTACT_FIELDS: &[FieldSpec] = &[
    required("name", "Name", FieldKind::Text),
    required("email", "Email", FieldKind::Text),
    field("subject", "Subject", FieldKind::Text),
    required("message", "Message", FieldKind::LongText),
    field("status", "Status", FieldKind::Choice(STATUS_OPTIONS)),
];

const BLOG_FIELDS: &[FieldSpec] = &[
    required("title", "Title", FieldKind::Text),
    field("slug", "URL Slug", FieldKind::Text),
    field("excerpt", "Excerpt", FieldKind::LongText),
    required("content", "Content", FieldKind::LongText),
    field("image_url", "Cover Image URL", FieldKind::Url),
    field("tags", "Tags", COMMA_LIST),
    field("published", "Publish this post", FieldKind::Flag),
];

pub fn field_set(kind: ContentType) -> &'static [FieldSpec] {
    match kind {
        ContentType::Profile => PROFILE_FIELDS,
        ContentType::Project => PROJECT_FIELDS,
        ContentType::Experience => EXPERIENCE_FIELDS,
        ContentType::Skill => SKILL_FIELDS,
        ContentType::Contact => CONTACT_FIELDS,
        ContentType::Blog => BLOG_FIELDS,
    }
}

fn find_field(kind: ContentType, name: &str) -> Option<&'static FieldSpec> {
    field_set(kind).iter().find(|f| f.name == name)
}

impl FieldSpec {
    fn default_value(&self) -> Value {
        match self.kind {
            FieldKind::Number => Value::from(0),
            FieldKind::Flag => Value::Bool(false),
            FieldKind::List(_) => Value::Array(Vec::new()),
            // Optional choices start on their first option.
            FieldKind::Choice(options) if !self.required => Value::from(options[0]),
            _ => Value::from(""),
        }
    }

    /// Coerce an incoming value into the shape this field stores.
    fn coerce(&self, value: &Value) -> Value {
        match self.kind {
            FieldKind::List(delimiter) => Value::from(clean_list(value, delimiter)),
            FieldKind::Number => Value::from(coerce_number(value)),
            FieldKind::Flag => Value::Bool(flag(Some(value))),
            _ => match value {
                Value::String(_) | Value::Null => value.clone(),
                other => Value::from(other.to_string()),
            },
        }
    }
}

/// Keys on incoming records that are not form fields.
const META_KEYS: &[&str] = &["id", "type", "created_at", "updated_at"];

// ============================================================================
// Draft
// ============================================================================

/// In-memory form state, addressed by dotted paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Draft(Map<String, Value>);

impl Draft {
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Set a value, creating intermediate objects and keeping sibling keys.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut parts: Vec<&str> = path.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };

        let mut current = &mut self.0;
        for part in parts {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry.as_object_mut() {
                Some(object) => object,
                None => return,
            };
        }
        current.insert(last.to_string(), value);
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

fn default_draft(kind: ContentType) -> Draft {
    let mut draft = Draft::default();
    for spec in field_set(kind) {
        draft.set(spec.name, spec.default_value());
    }
    draft
}

// ============================================================================
// Dialog
// ============================================================================

/// Form controller for a single content type.
#[derive(Debug, Clone)]
pub struct ContentDialog {
    kind: ContentType,
    open: bool,
    editing: Option<Uuid>,
    draft: Draft,
    error: Option<String>,
    submitting: bool,
}

impl ContentDialog {
    pub fn new(kind: ContentType) -> Self {
        Self {
            kind,
            open: false,
            editing: None,
            draft: default_draft(kind),
            error: None,
            submitting: false,
        }
    }

    /// Open for `kind`, seeded from `initial` (edit) or the default skeleton (create).
    pub fn open(&mut self, kind: ContentType, initial: Option<&Value>) {
        self.kind = kind;
        self.draft = default_draft(kind);
        self.editing = None;
        self.error = None;
        self.submitting = false;

        if let Some(initial) = initial {
            self.editing = initial
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id).ok());

            let seed = Draft(initial.as_object().cloned().unwrap_or_default());
            for spec in field_set(kind) {
                let Some(value) = seed.get(spec.name) else {
                    continue;
                };
                let value = match spec.kind {
                    // A list field holding anything but an array starts empty.
                    FieldKind::List(delimiter) if value.is_array() => {
                        Value::from(clean_list(value, delimiter))
                    }
                    FieldKind::List(_) => Value::Array(Vec::new()),
                    _ => value.clone(),
                };
                self.draft.set(spec.name, value);
            }
        }

        self.open = true;
        tracing::debug!(kind = %kind, editing = ?self.editing, "content dialog opened");
    }

    pub fn close(&mut self) {
        self.open = false;
        self.submitting = false;
        self.error = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn kind(&self) -> ContentType {
        self.kind
    }

    pub fn editing_id(&self) -> Option<Uuid> {
        self.editing
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        field_set(self.kind)
    }

    pub fn title(&self) -> String {
        if self.editing.is_some() {
            format!("Edit {}", self.kind)
        } else {
            format!("Add New {}", self.kind)
        }
    }

    pub fn description(&self) -> &'static str {
        match self.kind {
            ContentType::Profile => "Update your profile information.",
            ContentType::Project => "Add details about your project.",
            ContentType::Experience => "Add details about your work experience.",
            ContentType::Skill => "Add details about your skills.",
            ContentType::Contact => "Review a contact message.",
            ContentType::Blog => "Create or edit a blog post.",
        }
    }

    /// Whether a field accepts input given the current draft.
    pub fn is_enabled(&self, name: &str) -> bool {
        !(self.kind == ContentType::Experience
            && name == "end_date"
            && flag(self.draft.get("current")))
    }

    /// Keystroke into a text input. List fields are re-split on every call.
    pub fn set_text(&mut self, path: &str, text: &str) -> Result<(), DialogError> {
        self.set_value(path, Value::from(text))
    }

    pub fn set_flag(&mut self, path: &str, on: bool) -> Result<(), DialogError> {
        self.set_value(path, Value::Bool(on))
    }

    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), DialogError> {
        let spec = find_field(self.kind, path).ok_or_else(|| DialogError::Invalid {
            field: path.to_string(),
            reason: format!("not a {} field", self.kind),
        })?;
        self.draft.set(spec.name, spec.coerce(&value));
        Ok(())
    }

    /// Apply a batch of edits. Nested objects address dotted fields.
    pub fn apply(&mut self, edits: &Value) -> Result<(), DialogError> {
        let object = edits.as_object().ok_or_else(|| DialogError::Invalid {
            field: "body".to_string(),
            reason: "expected a JSON object".to_string(),
        })?;
        self.apply_object("", object)
    }

    fn apply_object(&mut self, prefix: &str, object: &Map<String, Value>) -> Result<(), DialogError> {
        for (key, value) in object {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            if find_field(self.kind, &path).is_some() {
                self.set_value(&path, value.clone())?;
            } else if let Value::Object(nested) = value {
                self.apply_object(&path, nested)?;
            } else if prefix.is_empty() && META_KEYS.contains(&key.as_str()) {
                continue;
            } else {
                return Err(DialogError::Invalid {
                    field: path,
                    reason: format!("not a {} field", self.kind),
                });
            }
        }
        Ok(())
    }

    /// Text shown in a list field's input.
    pub fn list_text(&self, path: &str) -> String {
        match find_field(self.kind, path).map(|f| f.kind) {
            Some(FieldKind::List(delimiter)) => self
                .draft
                .get(path)
                .map(|v| delimiter.join(&clean_list(v, delimiter)))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Normalize the draft into a typed record.
    pub fn normalize(&self) -> Result<Record, DialogError> {
        for spec in self.fields() {
            if spec.required && optional_text(self.draft.get(spec.name)).is_none() {
                return Err(DialogError::MissingField(spec.label.to_string()));
            }
        }

        let d = &self.draft;
        let list = |path: &str| {
            let delimiter = match find_field(self.kind, path).map(|f| f.kind) {
                Some(FieldKind::List(delimiter)) => delimiter,
                _ => Delimiter::Comma,
            };
            d.get(path).map(|v| clean_list(v, delimiter)).unwrap_or_default()
        };
        let count = |path: &str| d.get(path).map(coerce_count).unwrap_or(0);

        let record = match self.kind {
            ContentType::Profile => Record::Profile(Profile {
                name: text(d.get("name")),
                title: text(d.get("title")),
                bio: long_text(d.get("bio")),
                avatar_url: optional_text(d.get("avatar_url")),
                email: optional_text(d.get("email")),
                years_of_experience: count("years_of_experience"),
                companies: count("companies"),
                core_competencies: list("core_competencies"),
                specialized_skills: list("specialized_skills"),
                approach_text: long_text(d.get("approach_text")),
                security_audits_count: count("security_audits_count"),
                vulnerabilities_count: count("vulnerabilities_count"),
                architectures_count: count("architectures_count"),
                certifications_count: count("certifications_count"),
                github_url: optional_text(d.get("github_url")),
                linkedin_url: optional_text(d.get("linkedin_url")),
                twitter_url: optional_text(d.get("twitter_url")),
            }),

            ContentType::Project => {
                let color = match optional_text(d.get("color")) {
                    None => GradientColor::default(),
                    Some(token) => {
                        GradientColor::from_token(&token).ok_or_else(|| DialogError::Invalid {
                            field: "color".to_string(),
                            reason: format!("'{}' is not a known gradient", token),
                        })?
                    }
                };
                Record::Project(Project {
                    title: text(d.get("title")),
                    description: long_text(d.get("description")),
                    image_url: optional_text(d.get("image_url")),
                    github_url: optional_text(d.get("github_url")),
                    live_url: optional_text(d.get("live_url")),
                    tags: list("tags"),
                    technologies: list("technologies"),
                    details: ProjectDetails {
                        challenge: long_text(d.get("details.challenge")),
                        solution: long_text(d.get("details.solution")),
                        technologies: list("details.technologies"),
                        outcome: long_text(d.get("details.outcome")),
                    },
                    color,
                })
            }

            ContentType::Experience => {
                let invalid_date = |field: &str| {
                    let field = field.to_string();
                    move |reason: String| DialogError::Invalid { field, reason }
                };
                let current = flag(d.get("current"));
                let start_date = parse_date(d.get("start_date"))
                    .map_err(invalid_date("start_date"))?
                    .ok_or_else(|| DialogError::MissingField("Start Date".to_string()))?;
                // A current position never has an end date.
                let end_date = if current {
                    None
                } else {
                    parse_date(d.get("end_date")).map_err(invalid_date("end_date"))?
                };
                if end_date.is_some_and(|end| end < start_date) {
                    return Err(DialogError::Invalid {
                        field: "end_date".to_string(),
                        reason: "ends before it starts".to_string(),
                    });
                }
                Record::Experience(Experience {
                    company: text(d.get("company")),
                    position: text(d.get("position")),
                    start_date,
                    end_date,
                    current,
                    mission: long_text(d.get("mission")),
                    achievements: list("achievements"),
                })
            }

            ContentType::Skill => {
                let category = SkillCategory::from(text(d.get("category")));
                let icon = optional_text(d.get("icon"))
                    .unwrap_or_else(|| category.default_icon().to_string());
                Record::Skill(Skill {
                    name: text(d.get("name")),
                    level: d.get("level").map(coerce_level).unwrap_or(0),
                    icon,
                    category,
                })
            }

            ContentType::Contact => {
                let email = text(d.get("email"));
                if !email.contains('@') {
                    return Err(DialogError::Invalid {
                        field: "email".to_string(),
                        reason: "invalid email format".to_string(),
                    });
                }
                let status = match optional_text(d.get("status")) {
                    None => ContactStatus::default(),
                    Some(s) => serde_json::from_value::<ContactStatus>(Value::from(s.clone())).map_err(|_| {
                        DialogError::Invalid {
                            field: "status".to_string(),
                            reason: format!("'{}' is not a contact status", s),
                        }
                    })?,
                };
                Record::Contact(Contact {
                    name: text(d.get("name")),
                    email,
                    subject: text(d.get("subject")),
                    message: long_text(d.get("message")),
                    status,
                })
            }

            ContentType::Blog => {
                let title = text(d.get("title"));
                let slug = match optional_text(d.get("slug")) {
                    Some(slug) => slugify(&slug),
                    None => slugify(&title),
                };
                if slug.is_empty() {
                    return Err(DialogError::Invalid {
                        field: "slug".to_string(),
                        reason: "needs at least one letter or digit".to_string(),
                    });
                }
                Record::Blog(Blog {
                    title,
                    slug,
                    content: long_text(d.get("content")),
                    excerpt: long_text(d.get("excerpt")),
                    image_url: optional_text(d.get("image_url")),
                    tags: list("tags"),
                    published: flag(d.get("published")),
                })
            }
        };

        Ok(record)
    }

    /// Normalize and hand the record to `on_submit`. Closes on success; on
    /// failure keeps the dialog open with the draft intact and the error inline.
    pub async fn submit<F, Fut, E>(&mut self, on_submit: F) -> Result<Record, DialogError>
    where
        F: FnOnce(Record) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        if !self.open {
            return Err(DialogError::Closed);
        }

        let record = match self.normalize() {
            Ok(record) => record,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.submitting = true;
        let result = on_submit(record.clone()).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                self.error = None;
                self.open = false;
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "content submit failed");
                self.error = Some(e.to_string());
                Err(DialogError::Rejected(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn opened(kind: ContentType) -> ContentDialog {
        let mut dialog = ContentDialog::new(kind);
        dialog.open(kind, None);
        dialog
    }

    #[test]
    fn test_color_options_match_gradient_tokens() {
        let tokens: Vec<&str> = GradientColor::ALL.iter().map(|c| c.token()).collect();
        assert_eq!(tokens, COLOR_OPTIONS);
    }

    #[test]
    fn test_default_skeleton_per_type() {
        let dialog = opened(ContentType::Project);
        assert_eq!(dialog.draft().get("tags"), Some(&json!([])));
        assert_eq!(dialog.draft().get("details.challenge"), Some(&json!("")));
        assert_eq!(dialog.draft().get("color"), Some(&json!(COLOR_OPTIONS[0])));
        assert_eq!(dialog.title(), "Add New project");

        let dialog = opened(ContentType::Contact);
        assert_eq!(dialog.draft().get("status"), Some(&json!("unread")));
    }

    #[test]
    fn test_open_resets_non_array_list_fields() {
        let mut dialog = ContentDialog::new(ContentType::Blog);
        let initial = json!({
            "id": "0b7c1f8e-4c52-4d3a-9d7e-3c9a0c2f5e11",
            "title": "Hello",
            "tags": "not-an-array",
            "slug": "hello"
        });
        dialog.open(ContentType::Blog, Some(&initial));

        assert_eq!(dialog.draft().get("tags"), Some(&json!([])));
        assert!(dialog.editing_id().is_some());
        assert_eq!(dialog.title(), "Edit blog");
    }

    #[test]
    fn test_list_fields_stay_clean_on_every_keystroke() {
        let mut dialog = opened(ContentType::Blog);
        for text in ["r", "rust,", "rust, ", "rust, , web", "rust, , web,"] {
            dialog.set_text("tags", text).unwrap();
            let tags = dialog.draft().get("tags").unwrap().as_array().unwrap();
            assert!(tags.iter().all(|t| !t.as_str().unwrap().is_empty()));
        }
        assert_eq!(dialog.draft().get("tags"), Some(&json!(["rust", "web"])));
        assert_eq!(dialog.list_text("tags"), "rust, web");
    }

    #[test]
    fn test_nested_edit_keeps_siblings() {
        let mut dialog = opened(ContentType::Project);
        dialog.set_text("details.challenge", "Legacy auth").unwrap();
        dialog.set_text("details.outcome", "Zero incidents").unwrap();
        dialog.set_text("details.technologies", "Rust, Postgres").unwrap();

        let details = dialog.draft().get("details").unwrap();
        assert_eq!(details["challenge"], "Legacy auth");
        assert_eq!(details["outcome"], "Zero incidents");
        assert_eq!(details["solution"], "");
        assert_eq!(details["technologies"], json!(["Rust", "Postgres"]));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut dialog = opened(ContentType::Skill);
        assert!(dialog.set_text("proficiency", "80").is_err());
    }

    #[test]
    fn test_current_experience_drops_end_date() {
        let mut dialog = opened(ContentType::Experience);
        dialog
            .apply(&json!({
                "company": "Acme",
                "position": "Analyst",
                "start_date": "2021-01-01",
                "end_date": "2022-06-30",
                "current": true,
                "achievements": "Found 10 bugs\nWrote 3 reports"
            }))
            .unwrap();
        assert!(!dialog.is_enabled("end_date"));

        let Record::Experience(exp) = dialog.normalize().unwrap() else {
            panic!("expected an experience");
        };
        assert_eq!(exp.end_date, None);
        assert_eq!(exp.start_date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(exp.achievements, vec!["Found 10 bugs", "Wrote 3 reports"]);
    }

    #[test]
    fn test_experience_end_before_start_is_invalid() {
        let mut dialog = opened(ContentType::Experience);
        dialog
            .apply(&json!({
                "company": "Acme",
                "position": "Analyst",
                "start_date": "2022-01-01",
                "end_date": "2021-01-01"
            }))
            .unwrap();
        assert!(matches!(dialog.normalize(), Err(DialogError::Invalid { .. })));
    }

    #[test]
    fn test_skill_icon_defaults_by_category() {
        let mut dialog = opened(ContentType::Skill);
        dialog.set_text("name", "Wireshark").unwrap();
        dialog.set_text("category", "Security Tools").unwrap();
        dialog.set_text("level", "not a number").unwrap();

        let Record::Skill(skill) = dialog.normalize().unwrap() else {
            panic!("expected a skill");
        };
        assert_eq!(skill.icon, "🛠️");
        assert_eq!(skill.level, 0);

        dialog.set_text("category", "Soft Skills").unwrap();
        dialog.set_text("level", "85").unwrap();
        let Record::Skill(skill) = dialog.normalize().unwrap() else {
            panic!("expected a skill");
        };
        assert_eq!(skill.icon, "💻");
        assert_eq!(skill.level, 85);
    }

    #[test]
    fn test_blog_slug_derived_from_title() {
        let mut dialog = opened(ContentType::Blog);
        dialog.set_text("title", "My First Post!").unwrap();
        dialog.set_text("content", "Hello").unwrap();

        let Record::Blog(blog) = dialog.normalize().unwrap() else {
            panic!("expected a blog");
        };
        assert_eq!(blog.slug, "my-first-post");
    }

    #[test]
    fn test_missing_required_field() {
        let dialog = opened(ContentType::Project);
        assert_eq!(
            dialog.normalize(),
            Err(DialogError::MissingField("Title".to_string()))
        );
    }

    #[test]
    fn test_blog_content_keeps_leading_whitespace() {
        let mut dialog = opened(ContentType::Blog);
        let body = "Intro\n\n    fn main() {}\n";
        dialog
            .apply(&json!({ "title": "  Code  ", "content": body }))
            .unwrap();
        let Record::Blog(blog) = dialog.normalize().unwrap() else {
            panic!("expected a blog record");
        };
        assert_eq!(blog.title, "Code");
        assert_eq!(blog.content, body);
    }

    #[test]
    fn test_whitespace_only_content_is_missing() {
        let mut dialog = opened(ContentType::Blog);
        dialog
            .apply(&json!({ "title": "Post", "content": "   \n  " }))
            .unwrap();
        assert_eq!(
            dialog.normalize(),
            Err(DialogError::MissingField("Content".to_string()))
        );
    }

    #[test]
    fn test_unknown_color_is_invalid() {
        let mut dialog = opened(ContentType::Project);
        dialog
            .apply(&json!({ "title": "x", "description": "y", "color": "bg-red-500" }))
            .unwrap();
        assert!(matches!(dialog.normalize(), Err(DialogError::Invalid { .. })));
    }

    #[tokio::test]
    async fn test_submit_closes_on_success() {
        let mut dialog = opened(ContentType::Skill);
        dialog.set_text("name", "Rust").unwrap();
        dialog.set_text("category", "Technical Skills").unwrap();

        let record = dialog
            .submit(|_| async { Ok::<(), String>(()) })
            .await
            .unwrap();
        assert_eq!(record.content_type(), ContentType::Skill);
        assert!(!dialog.is_open());
        assert!(dialog.error().is_none());
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_draft_and_stays_open() {
        let mut dialog = opened(ContentType::Skill);
        dialog.set_text("name", "Rust").unwrap();
        dialog.set_text("category", "Technical Skills").unwrap();
        let before = dialog.draft().clone();

        let result = dialog
            .submit(|_| async { Err::<(), _>("insert failed") })
            .await;
        assert_eq!(result, Err(DialogError::Rejected("insert failed".to_string())));
        assert!(dialog.is_open());
        assert_eq!(dialog.error(), Some("insert failed"));
        assert_eq!(dialog.draft(), &before);
    }

    #[tokio::test]
    async fn test_submit_on_closed_dialog() {
        let mut dialog = ContentDialog::new(ContentType::Blog);
        let result = dialog.submit(|_| async { Ok::<(), String>(()) }).await;
        assert_eq!(result, Err(DialogError::Closed));
    }
}
