/// Database row types — these map directly to SQLite rows.
/// Distinct from the pharmathon-types API models to keep the DB layer
/// independent; enum columns stay as their label strings here.

#[derive(Debug, Clone)]
pub struct RegistrationRow {
    pub id: i64,
    pub full_name: String,
    pub dob: String,
    pub sex: String,
    pub phone: String,
    pub email: String,
    pub affiliation: String,
    pub student_origin: Option<String>,
    pub student_origin_other: Option<String>,
    pub event_choice: String,
    pub confirmed: bool,
    pub confirm_token: String,
    pub checkin_code: String,
    pub checkin_at: Option<String>,
    pub reminded7: bool,
    pub reminded3: bool,
    pub reminded1: bool,
    pub created_at: String,
}
