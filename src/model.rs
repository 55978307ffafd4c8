//! Domain types exchanged with the roster API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a student.
pub type StudentId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    /// Wire representation, also used for display in the table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Other,
            Self::Other => Self::Male,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Self {
        match self {
            Self::Male => Self::Other,
            Self::Female => Self::Male,
            Self::Other => Self::Female,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student record as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub gender: Gender,
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The writable fields of a student, sent when creating one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub gender: Gender,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_wire_format() {
        let json = r#"{"id":1,"name":"Bill Gates","email":"b@x.com","gender":"MALE"}"#;
        let student: Student = serde_json::from_str(json).unwrap();
        assert_eq!(student.id, 1);
        assert_eq!(student.gender, Gender::Male);
        assert_eq!(serde_json::to_string(&student).unwrap(), json);
    }

    #[test]
    fn test_new_student_has_no_id() {
        let new = NewStudent {
            name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            gender: Gender::Female,
        };
        let value = serde_json::to_value(&new).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["gender"], "FEMALE");
    }

    #[test]
    fn test_unknown_gender_is_rejected() {
        let json = r#"{"id":1,"name":"a","email":"b","gender":"UNKNOWN"}"#;
        assert!(serde_json::from_str::<Student>(json).is_err());
    }

    #[test]
    fn test_gender_cycles() {
        for gender in Gender::ALL {
            assert_eq!(gender.next().previous(), gender);
        }
        assert_eq!(Gender::Other.next(), Gender::Male);
    }
}
