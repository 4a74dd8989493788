/*!
 * Content Module
 * Content-type tags, normalized records and the editing dialog
 */
pub mod dialog;
pub mod normalize;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::db::models::{Blog, Contact, Experience, Profile, Project, Row, Skill, SkillCategory};
use crate::error::{StoreError, StoreResult};
use crate::store::Table;

pub use dialog::ContentDialog;

/// The six editable content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Profile,
    Project,
    Experience,
    Skill,
    Contact,
    Blog,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::Profile,
        ContentType::Project,
        ContentType::Experience,
        ContentType::Skill,
        ContentType::Contact,
        ContentType::Blog,
    ];

    pub fn table(&self) -> Table {
        match self {
            ContentType::Profile => Table::Profile,
            ContentType::Project => Table::Projects,
            ContentType::Experience => Table::Experiences,
            ContentType::Skill => Table::Skills,
            ContentType::Contact => Table::Contacts,
            ContentType::Blog => Table::Blogs,
        }
    }

    pub fn from_table(table: Table) -> Self {
        match table {
            Table::Profile => ContentType::Profile,
            Table::Projects => ContentType::Project,
            Table::Experiences => ContentType::Experience,
            Table::Skills => ContentType::Skill,
            Table::Contacts => ContentType::Contact,
            Table::Blogs => ContentType::Blog,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Profile => "profile",
            ContentType::Project => "project",
            ContentType::Experience => "experience",
            ContentType::Skill => "skill",
            ContentType::Contact => "contact",
            ContentType::Blog => "blog",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts both the singular tag and the table name.
impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.table().name() == s)
            .ok_or_else(|| format!("unknown content type '{}'", s))
    }
}

/// A normalized record, ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Profile(Profile),
    Project(Project),
    Experience(Experience),
    Skill(Skill),
    Contact(Contact),
    Blog(Blog),
}

impl Record {
    pub fn content_type(&self) -> ContentType {
        match self {
            Record::Profile(_) => ContentType::Profile,
            Record::Project(_) => ContentType::Project,
            Record::Experience(_) => ContentType::Experience,
            Record::Skill(_) => ContentType::Skill,
            Record::Contact(_) => ContentType::Contact,
            Record::Blog(_) => ContentType::Blog,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Record::Profile(r) => serde_json::to_value(r),
            Record::Project(r) => serde_json::to_value(r),
            Record::Experience(r) => serde_json::to_value(r),
            Record::Skill(r) => serde_json::to_value(r),
            Record::Contact(r) => serde_json::to_value(r),
            Record::Blog(r) => serde_json::to_value(r),
        }
    }

    /// Image references carried by the record.
    pub fn image_urls(&self) -> Vec<&str> {
        match self {
            Record::Profile(p) => p.avatar_url.as_deref().into_iter().collect(),
            Record::Project(p) => p.image_url.as_deref().into_iter().collect(),
            Record::Blog(b) => b.image_url.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// An explicitly tagged reference to a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub id: Uuid,
}

impl RecordRef {
    pub fn new(kind: ContentType, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Resolve the table an untyped record belongs to.
///
/// An explicit `type` tag (content type or table name) wins. Otherwise the
/// record's fields decide: `company` → experiences, `level` → skills,
/// `technologies` → projects, `slug` → blogs, `message` → contacts.
pub fn resolve_table(record: &Value) -> Option<Table> {
    if let Some(tag) = record.get("type").and_then(Value::as_str) {
        return tag.parse::<ContentType>().ok().map(|t| t.table());
    }

    let has = |field: &str| record.get(field).is_some();
    if has("company") {
        Some(Table::Experiences)
    } else if has("level") {
        Some(Table::Skills)
    } else if has("technologies") {
        Some(Table::Projects)
    } else if has("slug") {
        Some(Table::Blogs)
    } else if has("message") {
        Some(Table::Contacts)
    } else {
        None
    }
}

/// Decode a stored JSON row into its typed form.
pub fn decode_row<T: DeserializeOwned>(table: Table, row: Value) -> StoreResult<Row<T>> {
    serde_json::from_value(row).map_err(|e| StoreError::InvalidRow {
        table,
        reason: e.to_string(),
    })
}

pub fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> StoreResult<Vec<Row<T>>> {
    rows.into_iter().map(|row| decode_row(table, row)).collect()
}

/// Skills sharing one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGroup {
    pub category: SkillCategory,
    pub skills: Vec<Row<Skill>>,
}

/// Group skills by category, categories in first-seen order.
pub fn group_skills(skills: &[Row<Skill>]) -> Vec<SkillGroup> {
    let mut groups: Vec<SkillGroup> = Vec::new();
    for skill in skills {
        match groups.iter_mut().find(|g| g.category == skill.data.category) {
            Some(group) => group.skills.push(skill.clone()),
            None => groups.push(SkillGroup {
                category: skill.data.category.clone(),
                skills: vec![skill.clone()],
            }),
        }
    }
    groups
}
