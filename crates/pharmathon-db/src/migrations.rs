use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS registrations (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name            TEXT NOT NULL,
            dob                  TEXT NOT NULL,
            sex                  TEXT NOT NULL
                CHECK (sex IN ('Homme', 'Femme')),
            phone                TEXT NOT NULL,
            email                TEXT NOT NULL,
            affiliation          TEXT NOT NULL
                CHECK (affiliation IN (
                    'Étudiant(e)', 'Enseignant(e)', 'Pharmacien(ne)',
                    'Personnel', 'Technicien(ne)', 'Ancien(ne) diplômé(e)',
                    'Famille / accompagnant'
                )),
            student_origin       TEXT
                CHECK (student_origin IN ('FPHM', 'Autre')),
            student_origin_other TEXT,
            event_choice         TEXT NOT NULL
                CHECK (event_choice IN ('Pharmathon (8 km)', 'marchathon (4 km)')),
            confirmed            INTEGER NOT NULL DEFAULT 0,
            confirm_token        TEXT NOT NULL,
            checkin_code         TEXT NOT NULL,
            checkin_at           TEXT,
            reminded7            INTEGER NOT NULL DEFAULT 0,
            reminded3            INTEGER NOT NULL DEFAULT 0,
            reminded1            INTEGER NOT NULL DEFAULT 0,
            created_at           TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (email, event_choice)
        );

        CREATE INDEX IF NOT EXISTS idx_registrations_confirm_token
            ON registrations(confirm_token);

        CREATE INDEX IF NOT EXISTS idx_registrations_checkin_code
            ON registrations(checkin_code);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
