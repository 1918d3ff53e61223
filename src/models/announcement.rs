use serde::{Deserialize, Serialize};

/// A school announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "schoolName")]
    pub school_name: Option<String>,
    #[serde(default, alias = "teacherName")]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Announcement {
    pub fn posted_by(&self) -> String {
        match (&self.teacher_name, &self.school_name) {
            (Some(teacher), _) if !teacher.is_empty() => teacher.clone(),
            (_, Some(school)) if !school.is_empty() => school.clone(),
            _ => "Unknown".to_string(),
        }
    }
}
