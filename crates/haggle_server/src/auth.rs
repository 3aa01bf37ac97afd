//! Bearer token verification
//!
//! Tokens are minted elsewhere; this side only checks the HS256 signature and
//! expiry and hands back the claims.

use haggle_api::AccessTokenClaims;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::error::ServerResult;

/// Validate an access token
pub fn validate_access_token(
    token: &str,
    decoding_key: &DecodingKey,
) -> ServerResult<AccessTokenClaims> {
    let token_data = decode::<AccessTokenClaims>(
        token,
        decoding_key,
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::UserId;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use pretty_assertions::assert_eq;

    const SECRET: &[u8] = b"test-secret";

    fn token(claims: &AccessTokenClaims, secret: &[u8]) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let user = UserId::generate();
        let claims = AccessTokenClaims::new(user, 3600);

        let decoded =
            validate_access_token(&token(&claims, SECRET), &DecodingKey::from_secret(SECRET))
                .unwrap();
        assert_eq!(decoded.sub, user);
    }

    #[test]
    fn test_wrong_secret_and_expiry_are_rejected() {
        let claims = AccessTokenClaims::new(UserId::generate(), 3600);
        assert!(
            validate_access_token(
                &token(&claims, b"other-secret"),
                &DecodingKey::from_secret(SECRET)
            )
            .is_err()
        );

        let expired = AccessTokenClaims::new(UserId::generate(), -3600);
        assert!(
            validate_access_token(&token(&expired, SECRET), &DecodingKey::from_secret(SECRET))
                .is_err()
        );
    }
}
