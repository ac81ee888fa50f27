use rand::RngCore;
use uuid::Uuid;

const TOKEN_BYTES: usize = 40;

/// Opaque single-use token: `<userId>.<80 hex chars>`.
pub fn opaque_token(user_id: &Uuid) -> String {
    format!("{user_id}.{}", random_hex(TOKEN_BYTES))
}

/// Password assigned to accounts created through an OAuth provider.
pub fn random_password() -> String {
    random_hex(32)
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
