use acadex::config::jwt::JwtConfig;
use acadex::modules::auth::model::UserRole;
use acadex::utils::jwt::{
    create_access_token, create_refresh_token, verify_access_token, verify_refresh_token,
};
use uuid::Uuid;

fn test_config() -> JwtConfig {
    JwtConfig {
        access_secret: "unit-access-secret-at-least-32-chars-xx".to_string(),
        refresh_secret: "unit-refresh-secret-at-least-32-chars-x".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
    }
}

#[test]
fn test_access_claims_carry_user_and_role() {
    let config = test_config();
    let user_id = Uuid::new_v4();

    for role in [UserRole::Admin, UserRole::Student, UserRole::Instructor] {
        let token = create_access_token(user_id, role, &config).unwrap();
        let claims = verify_access_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, role);
    }
}

#[test]
fn test_refresh_claims_carry_only_user() {
    let config = test_config();
    let user_id = Uuid::new_v4();

    let token = create_refresh_token(user_id, &config).unwrap();
    let claims = verify_refresh_token(&token, &config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_tokens_from_other_secrets_rejected() {
    let config = test_config();
    let other = JwtConfig {
        access_secret: "a-completely-different-access-secret-xx".to_string(),
        refresh_secret: "a-completely-different-refresh-secret-x".to_string(),
        ..test_config()
    };
    let user_id = Uuid::new_v4();

    let access = create_access_token(user_id, UserRole::Student, &other).unwrap();
    assert!(verify_access_token(&access, &config).is_err());

    let refresh = create_refresh_token(user_id, &other).unwrap();
    assert!(verify_refresh_token(&refresh, &config).is_err());
}

#[test]
fn test_expired_access_token_rejected() {
    // Well past the verifier's default leeway.
    let config = JwtConfig {
        access_token_expiry: -300,
        ..test_config()
    };

    let token = create_access_token(Uuid::new_v4(), UserRole::Student, &config).unwrap();
    let result = verify_access_token(&token, &test_config());

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    assert!(err.error.to_string().contains("expired"));
}

#[test]
fn test_tampered_token_rejected() {
    let config = test_config();
    let token = create_access_token(Uuid::new_v4(), UserRole::Student, &config).unwrap();

    let mut tampered = token.clone();
    tampered.pop();
    tampered.push('x');

    assert!(verify_access_token(&tampered, &config).is_err());
}
