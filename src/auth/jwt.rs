use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    chrono::Utc::now().timestamp().max(0) as usize
}

fn issue(
    employee_id: &str,
    name: &str,
    role: u8,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = Claims {
        sub: employee_id.to_string(),
        name: name.to_string(),
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn generate_access_token(
    employee_id: &str,
    name: &str,
    role: u8,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    issue(employee_id, name, role, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

pub fn generate_refresh_token(
    employee_id: &str,
    name: &str,
    role: u8,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    issue(employee_id, name, role, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trip() {
        let token = generate_access_token("EMP-001", "Jane Doe", 2, "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, "EMP-001");
        assert_eq!(claims.name, "Jane Doe");
        assert_eq!(claims.role, 2);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_tokens_get_unique_ids() {
        let (_, first) = generate_refresh_token("EMP-001", "Jane", 3, "secret", 60).unwrap();
        let (_, second) = generate_refresh_token("EMP-001", "Jane", 3, "secret", 60).unwrap();

        assert_eq!(first.token_type, TokenType::Refresh);
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token("EMP-001", "Jane", 3, "secret", 60).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
