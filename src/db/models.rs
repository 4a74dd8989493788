//! Database Models - the six content records (used by serde on JSON rows).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A persisted row: store-assigned identifier and timestamps around the record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row<T> {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile model (singleton)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub years_of_experience: i32,
    pub companies: i32,
    pub core_competencies: Vec<String>,
    pub specialized_skills: Vec<String>,
    pub approach_text: String,
    pub security_audits_count: i32,
    pub vulnerabilities_count: i32,
    pub architectures_count: i32,
    pub certifications_count: i32,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
}

/// Card background gradient for a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientColor {
    #[default]
    #[serde(rename = "from-cyan-500 to-blue-500")]
    CyanBlue,
    #[serde(rename = "from-purple-500 to-pink-500")]
    PurplePink,
    #[serde(rename = "from-green-500 to-teal-500")]
    GreenTeal,
    #[serde(rename = "from-orange-500 to-red-500")]
    OrangeRed,
    #[serde(rename = "from-indigo-500 to-violet-500")]
    IndigoViolet,
    #[serde(rename = "from-yellow-500 to-amber-500")]
    YellowAmber,
}

impl GradientColor {
    pub const ALL: [GradientColor; 6] = [
        GradientColor::CyanBlue,
        GradientColor::PurplePink,
        GradientColor::GreenTeal,
        GradientColor::OrangeRed,
        GradientColor::IndigoViolet,
        GradientColor::YellowAmber,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            GradientColor::CyanBlue => "from-cyan-500 to-blue-500",
            GradientColor::PurplePink => "from-purple-500 to-pink-500",
            GradientColor::GreenTeal => "from-green-500 to-teal-500",
            GradientColor::OrangeRed => "from-orange-500 to-red-500",
            GradientColor::IndigoViolet => "from-indigo-500 to-violet-500",
            GradientColor::YellowAmber => "from-yellow-500 to-amber-500",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token() == token.trim())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDetails {
    pub challenge: String,
    pub solution: String,
    pub technologies: Vec<String>,
    pub outcome: String,
}

/// Project model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub details: ProjectDetails,
    #[serde(default)]
    pub color: GradientColor,
}

/// Experience model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub mission: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

/// Skill category. Anything outside the four named groups is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkillCategory {
    TechnicalSkills,
    FrameworksAndStandards,
    SecurityTools,
    Certifications,
    Other(String),
}

impl SkillCategory {
    pub const NAMED: [SkillCategory; 4] = [
        SkillCategory::TechnicalSkills,
        SkillCategory::FrameworksAndStandards,
        SkillCategory::SecurityTools,
        SkillCategory::Certifications,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SkillCategory::TechnicalSkills => "Technical Skills",
            SkillCategory::FrameworksAndStandards => "Frameworks & Standards",
            SkillCategory::SecurityTools => "Security Tools",
            SkillCategory::Certifications => "Certifications",
            SkillCategory::Other(name) => name,
        }
    }

    /// Icon used when a skill has none of its own.
    pub fn default_icon(&self) -> &'static str {
        match self {
            SkillCategory::TechnicalSkills => "💻",
            SkillCategory::FrameworksAndStandards => "🔧",
            SkillCategory::SecurityTools => "🛠️",
            SkillCategory::Certifications => "🏆",
            SkillCategory::Other(_) => "💻",
        }
    }
}

impl From<String> for SkillCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Technical Skills" => SkillCategory::TechnicalSkills,
            "Frameworks & Standards" => SkillCategory::FrameworksAndStandards,
            "Security Tools" => SkillCategory::SecurityTools,
            "Certifications" => SkillCategory::Certifications,
            _ => SkillCategory::Other(s),
        }
    }
}

impl From<SkillCategory> for String {
    fn from(c: SkillCategory) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skill model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    Unread,
    Read,
    Replied,
}

/// Contact message model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub status: ContactStatus,
}

/// Blog post model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_flattens_record_fields() {
        let row: Row<Skill> = serde_json::from_value(json!({
            "id": "6f1c1f4e-8c1a-4b8a-9a51-0c1f6a3b9e10",
            "name": "Burp Suite",
            "category": "Security Tools",
            "level": 85,
            "icon": "🛠️",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(row.data.category, SkillCategory::SecurityTools);

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["category"], "Security Tools");
        assert_eq!(value["level"], 85);
    }

    #[test]
    fn test_unknown_category_is_preserved() {
        let category = SkillCategory::from("Cloud".to_string());
        assert_eq!(category, SkillCategory::Other("Cloud".into()));
        assert_eq!(category.default_icon(), "💻");
        assert_eq!(String::from(category), "Cloud");
    }

    #[test]
    fn test_gradient_color_tokens() {
        let color: GradientColor =
            serde_json::from_value(json!("from-purple-500 to-pink-500")).unwrap();
        assert_eq!(color, GradientColor::PurplePink);
        assert_eq!(GradientColor::from_token(" from-green-500 to-teal-500 "), Some(GradientColor::GreenTeal));
        assert!(GradientColor::from_token("bg-red").is_none());
    }

    #[test]
    fn test_contact_status_defaults_to_unread() {
        let contact: Contact = serde_json::from_value(json!({
            "name": "Ann",
            "email": "ann@example.com",
            "message": "hi"
        }))
        .unwrap();
        assert_eq!(contact.status, ContactStatus::Unread);
    }
}
