//! Domain enums with their fixed French labels. Labels are the wire and
//! storage representation; the enums exist so validation and the schema
//! CHECK constraints agree on one list.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Homme,
    Femme,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Homme, Sex::Femme];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Homme" => Some(Sex::Homme),
            "Femme" => Some(Sex::Femme),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Homme => "Homme",
            Sex::Femme => "Femme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affiliation {
    #[serde(rename = "Étudiant(e)")]
    Etudiant,
    #[serde(rename = "Enseignant(e)")]
    Enseignant,
    #[serde(rename = "Pharmacien(ne)")]
    Pharmacien,
    Personnel,
    #[serde(rename = "Technicien(ne)")]
    Technicien,
    #[serde(rename = "Ancien(ne) diplômé(e)")]
    AncienDiplome,
    #[serde(rename = "Famille / accompagnant")]
    Famille,
}

impl Affiliation {
    pub const ALL: [Affiliation; 7] = [
        Affiliation::Etudiant,
        Affiliation::Enseignant,
        Affiliation::Pharmacien,
        Affiliation::Personnel,
        Affiliation::Technicien,
        Affiliation::AncienDiplome,
        Affiliation::Famille,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Affiliation::Etudiant => "Étudiant(e)",
            Affiliation::Enseignant => "Enseignant(e)",
            Affiliation::Pharmacien => "Pharmacien(ne)",
            Affiliation::Personnel => "Personnel",
            Affiliation::Technicien => "Technicien(ne)",
            Affiliation::AncienDiplome => "Ancien(ne) diplômé(e)",
            Affiliation::Famille => "Famille / accompagnant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventChoice {
    #[serde(rename = "Pharmathon (8 km)")]
    Pharmathon,
    #[serde(rename = "marchathon (4 km)")]
    Marchathon,
}

impl EventChoice {
    pub const ALL: [EventChoice; 2] = [EventChoice::Pharmathon, EventChoice::Marchathon];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventChoice::Pharmathon => "Pharmathon (8 km)",
            EventChoice::Marchathon => "marchathon (4 km)",
        }
    }
}

/// Only meaningful when affiliation is Étudiant(e).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentOrigin {
    #[serde(rename = "FPHM")]
    Fphm,
    Autre,
}

impl StudentOrigin {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FPHM" => Some(StudentOrigin::Fphm),
            "Autre" => Some(StudentOrigin::Autre),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StudentOrigin::Fphm => "FPHM",
            StudentOrigin::Autre => "Autre",
        }
    }
}

/// One of the fixed day-count thresholds before the event at which a
/// reminder is due. Each maps to its own once-only flag column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Seven,
    Three,
    One,
}

impl Milestone {
    pub fn from_days_left(days_left: i64) -> Option<Self> {
        match days_left {
            7 => Some(Milestone::Seven),
            3 => Some(Milestone::Three),
            1 => Some(Milestone::One),
            _ => None,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Milestone::Seven => 7,
            Milestone::Three => 3,
            Milestone::One => 1,
        }
    }

    pub fn flag_column(&self) -> &'static str {
        match self {
            Milestone::Seven => "reminded7",
            Milestone::Three => "reminded3",
            Milestone::One => "reminded1",
        }
    }
}

/// A validated registration, ready to insert. Enum fields are stored as
/// their labels; `student_origin*` are None for non-student affiliations.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub full_name: String,
    pub dob: String,
    pub sex: Sex,
    pub phone: String,
    pub email: String,
    pub affiliation: Affiliation,
    pub student_origin: Option<StudentOrigin>,
    pub student_origin_other: Option<String>,
    pub event_choice: EventChoice,
}
