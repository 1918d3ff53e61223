use serde::{Deserialize, Serialize};

/// A detention entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detention {
    pub id: i64,
    /// Attendance marker as reported by the server ("yes"/"no"/"upscaled").
    #[serde(default)]
    pub attended: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    /// Length in minutes.
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(default, alias = "lessonName")]
    pub lesson_name: Option<String>,
    #[serde(default, alias = "teacherName")]
    pub teacher_name: Option<String>,
}

impl Detention {
    pub fn is_attended(&self) -> bool {
        self.attended
            .as_deref()
            .map(|a| a.eq_ignore_ascii_case("yes"))
            .unwrap_or(false)
    }
}
