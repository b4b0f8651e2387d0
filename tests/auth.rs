use jsonwebtoken::{DecodingKey, Validation, decode};
use order_desk::{
    dto::auth::{Claims, LoginRequest, RegisterRequest},
    error::AppError,
    services::auth_service,
    state::AppState,
    store::MemoryStore,
};

const SECRET: &str = "test-secret";

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        username: "collector".into(),
        email: email.into(),
        password: "hunter22".into(),
    }
}

#[tokio::test]
async fn register_then_login_issues_a_decodable_token() -> anyhow::Result<()> {
    // SAFETY: every test in this binary writes the same value.
    unsafe { std::env::set_var("JWT_SECRET", SECRET) };
    let state = AppState::new(MemoryStore::new());

    let user = auth_service::register_user(&state, register_request("a@example.com"))
        .await?
        .data
        .expect("user");
    assert_eq!(user.role, "user");
    assert_ne!(user.password_hash, "hunter22");

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: "a@example.com".into(),
            password: "hunter22".into(),
        },
    )
    .await?
    .data
    .expect("token");
    let token = login.token.strip_prefix("Bearer ").expect("bearer prefix");

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::default(),
    )?
    .claims;
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.role, "user");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected() -> anyhow::Result<()> {
    let state = AppState::new(MemoryStore::new());
    auth_service::register_user(&state, register_request("dup@example.com")).await?;

    let err = auth_service::register_user(&state, register_request("dup@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("taken")));
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> anyhow::Result<()> {
    let state = AppState::new(MemoryStore::new());
    auth_service::register_user(&state, register_request("b@example.com")).await?;

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: "b@example.com".into(),
            password: "wrong".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn blank_fields_are_rejected() {
    let state = AppState::new(MemoryStore::new());
    let err = auth_service::register_user(
        &state,
        RegisterRequest {
            username: " ".into(),
            email: "c@example.com".into(),
            password: "pw".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}
