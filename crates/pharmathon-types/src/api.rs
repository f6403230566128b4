use serde::{Deserialize, Serialize};

// -- Registration --

/// Raw registration body. Everything is optional here: validation accumulates
/// one message per bad field instead of letting serde reject the payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub dob: Option<String>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub affiliation: Option<String>,
    pub student_origin: Option<String>,
    pub student_origin_other: Option<String>,
    pub event_choice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub ok: bool,
    pub registration: RegistrationId,
}

#[derive(Debug, Serialize)]
pub struct RegistrationId {
    pub id: i64,
}

/// Full registration row as the admin endpoints expose it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
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

// -- Check-in --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckinRequest {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckinResponse {
    pub ok: bool,
    pub registration: RegistrationView,
    pub name: String,
}

// -- Listing --

#[derive(Debug, Serialize)]
pub struct RegistrationsResponse {
    pub ok: bool,
    pub registrations: Vec<RegistrationView>,
}

/// Compact projection used by the legacy participants endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub event_choice: String,
    pub checked_in: bool,
    pub qr_code: String,
}

#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    pub ok: bool,
    pub registrations: Vec<ParticipantView>,
}

// -- Reminders --

/// Outcome of one reminder run, identical for the timer and the manual
/// trigger. `sent` is absent when the run was skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderReport {
    pub skipped: bool,
    pub days_left: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SendRemindersResponse {
    pub ok: bool,
    pub result: ReminderReport,
}

// -- Admin login --

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub token: String,
}
