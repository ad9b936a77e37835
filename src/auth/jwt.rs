use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Access tokens are issued by the identity service; this service only
/// verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("Refresh tokens cannot be used for API access".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::{Claims, TokenType, verify_token};

    fn token(token_type: TokenType, exp: usize, secret: &str) -> String {
        let claims = Claims {
            user_id: 7,
            sub: "eve".to_string(),
            role: 3,
            exp,
            jti: "jti-1".to_string(),
            token_type,
            employee_id: Some(10),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    const FAR_FUTURE: usize = 4_102_444_800; // 2100-01-01

    #[test]
    fn accepts_a_valid_access_token() {
        let claims = verify_token(&token(TokenType::Access, FAR_FUTURE, "s3cret"), "s3cret").unwrap();
        assert_eq!((claims.user_id, claims.employee_id), (7, Some(10)));
    }

    #[test]
    fn rejects_refresh_tokens_wrong_secrets_and_expired_tokens() {
        assert!(verify_token(&token(TokenType::Refresh, FAR_FUTURE, "s3cret"), "s3cret").is_err());
        assert!(verify_token(&token(TokenType::Access, FAR_FUTURE, "other"), "s3cret").is_err());
        assert!(verify_token(&token(TokenType::Access, 1_000, "s3cret"), "s3cret").is_err());
    }
}
