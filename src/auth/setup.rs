use rand::Rng;

use crate::auth::jwt::hash_token;
use crate::db::DbPool;

/// Generate a 32-byte random setup token, hex-encoded (64 chars).
/// On first boot (no admin account), generate and print the token;
/// its SHA-256 hash is stored in server_settings.
pub fn generate_setup_token() -> String {
    let token_bytes: [u8; 32] = rand::rng().random();
    hex::encode(token_bytes)
}

/// Check if the server needs initial setup (no admin exists).
/// If so, generate a setup token, store its hash, and return the plaintext token.
pub fn maybe_generate_setup_token(db: &DbPool) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;

    let admin_count: i64 = conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
    if admin_count > 0 {
        return Ok(None);
    }

    // A token hash may exist from a previous boot before setup completed.
    // The plaintext is gone (only the hash was stored), so rotate it.
    let token = generate_setup_token();
    let hash = hash_token(&token);
    conn.execute(
        "INSERT OR REPLACE INTO server_settings (key, value) VALUES ('setup_token_hash', ?1)",
        [&hash],
    )?;

    Ok(Some(token))
}

/// Verify a setup token against the stored hash.
pub fn verify_setup_token(db: &DbPool, token: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;

    let stored_hash: Option<String> = conn
        .query_row(
            "SELECT value FROM server_settings WHERE key = 'setup_token_hash'",
            [],
            |row| row.get(0),
        )
        .ok();

    match stored_hash {
        Some(hash) => Ok(hash == hash_token(token)),
        None => Ok(false),
    }
}

/// Consume the setup token after the admin account is created.
pub fn consume_setup_token(db: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    conn.execute("DELETE FROM server_settings WHERE key = 'setup_token_hash'", [])?;
    conn.execute(
        "INSERT OR REPLACE INTO server_settings (key, value) VALUES ('setup_complete', 'true')",
        [],
    )?;
    Ok(())
}
