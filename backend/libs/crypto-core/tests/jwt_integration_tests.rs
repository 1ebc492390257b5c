/// Integration tests for crypto-core JWT functionality
///
/// Covers the access/refresh pair of a login session and the generic
/// encode/validate entry points used for non-session tokens.
use chrono::{Duration, Utc};
use crypto_core::jwt::{
    audience, decode_token_allow_expired, encode_token, initialize_jwt_keys, issuer,
    validate_token, Claims, JwtError, TokenScope,
};
use serde::{Deserialize, Serialize};
use std::sync::Once;
use uuid::Uuid;

const TEST_SECRET: &str = "integration-secret-0123456789abcdefghij";

fn init_keys() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        initialize_jwt_keys(
            TEST_SECRET,
            "https://insta.test",
            "https://insta.test/authentication/login",
        )
        .expect("init keys");
    });
}

fn session_claims(user_id: Uuid, jti: Uuid, scope: TokenScope, lifetime: Duration) -> Claims {
    let now = Utc::now();
    Claims {
        iss: issuer().unwrap().to_string(),
        sub: Claims::subject_for(user_id),
        aud: audience().unwrap().to_string(),
        exp: (now + lifetime).timestamp(),
        nbf: now.timestamp() - 1,
        iat: now.timestamp(),
        jti,
        scope,
        email: "sam@example.com".into(),
        name: "Sam Lee".into(),
        nickname: "Sam".into(),
        preferred_username: "sam".into(),
        given_name: "Sam".into(),
        middle_name: None,
        family_name: "Lee".into(),
        gender: None,
        birthdate: None,
        phone_number: None,
        address: None,
        updated_at: None,
    }
}

#[test]
fn access_and_refresh_tokens_share_jti() {
    init_keys();
    let user_id = Uuid::new_v4();
    let jti = Uuid::new_v4();

    let access = encode_token(&session_claims(
        user_id,
        jti,
        TokenScope::AccessToken,
        Duration::minutes(30),
    ))
    .unwrap();
    let refresh = encode_token(&session_claims(
        user_id,
        jti,
        TokenScope::RefreshToken,
        Duration::days(8),
    ))
    .unwrap();

    let access = validate_token::<Claims>(&access).unwrap().claims;
    let refresh = validate_token::<Claims>(&refresh).unwrap().claims;

    assert_eq!(access.jti, refresh.jti);
    assert_eq!(access.user_id().unwrap(), user_id);
    assert_eq!(access.scope, TokenScope::AccessToken);
    assert_eq!(refresh.scope, TokenScope::RefreshToken);
    assert!(refresh.exp > access.exp);
}

#[test]
fn expired_access_token_still_identifies_session() {
    init_keys();
    let user_id = Uuid::new_v4();
    let jti = Uuid::new_v4();
    let token = encode_token(&session_claims(
        user_id,
        jti,
        TokenScope::AccessToken,
        Duration::minutes(-90),
    ))
    .unwrap();

    assert!(matches!(validate_token::<Claims>(&token), Err(JwtError::Expired)));

    let claims = decode_token_allow_expired::<Claims>(&token).unwrap().claims;
    assert_eq!(claims.jti, jti);
    assert_eq!(claims.user_id().unwrap(), user_id);
}

#[derive(Debug, Serialize, Deserialize)]
struct PurposeClaims {
    iss: String,
    aud: String,
    sub: String,
    exp: i64,
    purpose: String,
}

#[test]
fn custom_claim_types_round_trip() {
    init_keys();
    let claims = PurposeClaims {
        iss: issuer().unwrap().to_string(),
        aud: audience().unwrap().to_string(),
        sub: "sam@example.com".into(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        purpose: "password_reset".into(),
    };

    let token = encode_token(&claims).unwrap();
    let decoded = validate_token::<PurposeClaims>(&token).unwrap().claims;
    assert_eq!(decoded.sub, "sam@example.com");
    assert_eq!(decoded.purpose, "password_reset");

    assert!(validate_token::<Claims>(&token).is_err());
}

#[test]
fn second_initialization_is_rejected() {
    init_keys();
    let result = initialize_jwt_keys(TEST_SECRET, "https://other.test", "https://other.test/a");
    assert!(matches!(result, Err(JwtError::AlreadyInitialized)));
}
