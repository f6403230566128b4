use chrono::NaiveDate;
use pharmathon_types::api::RegisterRequest;
use pharmathon_types::models::{Affiliation, EventChoice, NewRegistration, Sex, StudentOrigin};

/// Validate a raw registration body. Every field is checked independently and
/// every failure contributes one French message; the caller gets the full
/// list, never just the first problem.
pub fn parse_registration(req: &RegisterRequest) -> Result<NewRegistration, Vec<String>> {
    let mut errors = Vec::new();

    let full_name = req.full_name.as_deref().unwrap_or("").trim().to_string();
    if full_name.chars().count() < 2 {
        errors.push("Nom et prénom requis.".to_string());
    }

    let dob = req.dob.as_deref().unwrap_or("").trim().to_string();
    if NaiveDate::parse_from_str(&dob, "%Y-%m-%d").is_err() {
        errors.push("Date de naissance invalide (YYYY-MM-DD).".to_string());
    }

    let sex = req.sex.as_deref().and_then(Sex::parse);
    if sex.is_none() {
        errors.push("Sexe invalide.".to_string());
    }

    let phone = req.phone.as_deref().unwrap_or("").to_string();
    if !is_valid_phone(&phone) {
        errors.push("Numéro de téléphone invalide.".to_string());
    }

    let email = req.email.as_deref().unwrap_or("").trim().to_string();
    if !is_valid_email(&email) {
        errors.push("Adresse e-mail invalide.".to_string());
    }

    let affiliation = req.affiliation.as_deref().and_then(Affiliation::parse);
    if affiliation.is_none() {
        errors.push("Lien avec la FPHM invalide.".to_string());
    }

    let event_choice = req.event_choice.as_deref().and_then(EventChoice::parse);
    if event_choice.is_none() {
        errors.push("Choix de l’épreuve invalide.".to_string());
    }

    // Student-origin fields only exist for Étudiant(e); for every other
    // affiliation whatever was sent is ignored.
    let mut student_origin = None;
    let mut student_origin_other = None;
    if affiliation == Some(Affiliation::Etudiant) {
        student_origin = req.student_origin.as_deref().and_then(StudentOrigin::parse);
        match student_origin {
            None => errors.push("Origine étudiante invalide.".to_string()),
            Some(StudentOrigin::Autre) => {
                let other = req
                    .student_origin_other
                    .as_deref()
                    .unwrap_or("")
                    .trim()
                    .to_string();
                if other.is_empty() {
                    errors.push("Veuillez préciser votre établissement.".to_string());
                } else {
                    student_origin_other = Some(other);
                }
            }
            Some(StudentOrigin::Fphm) => {}
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // An empty error list means every parse succeeded; the fallback arm is
    // unreachable but keeps this total without panicking.
    match (sex, affiliation, event_choice) {
        (Some(sex), Some(affiliation), Some(event_choice)) => Ok(NewRegistration {
            full_name,
            dob,
            sex,
            phone,
            email,
            affiliation,
            student_origin,
            student_origin_other,
            event_choice,
        }),
        _ => Err(vec!["Requête invalide.".to_string()]),
    }
}

fn is_valid_phone(s: &str) -> bool {
    let len = s.chars().count();
    (6..=20).contains(&len)
        && s.chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ')
}

/// Same shape the original enforced: local part, '@', domain with a dot, no
/// whitespace anywhere.
fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
