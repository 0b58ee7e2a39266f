use super::*;

#[test]
fn user_deserializes_full_object() {
    let user: User = serde_json::from_str(r#"{"id":"u1","username":"alice","email":"a@example.com"}"#).unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "a@example.com");
}

#[test]
fn user_numeric_id_becomes_string() {
    let user: User = serde_json::from_str(r#"{"id":42,"username":"bob","email":"b@example.com"}"#).unwrap();
    assert_eq!(user.id, "42");
}

#[test]
fn user_missing_fields_default_to_empty() {
    let user: User = serde_json::from_str(r#"{"username":"carol"}"#).unwrap();
    assert_eq!(user.id, "");
    assert_eq!(user.username, "carol");
    assert_eq!(user.email, "");
}

#[test]
fn user_null_id_defaults_to_empty() {
    let user: User = serde_json::from_str(r#"{"id":null,"username":"dan"}"#).unwrap();
    assert_eq!(user.id, "");
}

#[test]
fn user_ignores_unknown_fields() {
    let user: User =
        serde_json::from_str(r#"{"id":"u9","username":"erin","email":"e@x.io","avatar":"x.png"}"#).unwrap();
    assert_eq!(user.username, "erin");
}

#[test]
fn login_request_serializes_credentials() {
    let req = LoginRequest { username: "alice".into(), password: "hunter2".into() };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["username"], "alice");
    assert_eq!(json["password"], "hunter2");
}

#[test]
fn login_response_without_refresh_token() {
    let resp: LoginResponse = serde_json::from_str(
        r#"{"access_token":"at","user":{"id":"u1","username":"alice","email":"a@example.com"}}"#,
    )
    .unwrap();
    assert_eq!(resp.access_token, "at");
    assert!(resp.refresh_token.is_none());
    assert_eq!(resp.user.username, "alice");
}

#[test]
fn refresh_response_with_rotated_token() {
    let resp: RefreshResponse = serde_json::from_str(r#"{"access_token":"at2","refresh_token":"rt2"}"#).unwrap();
    assert_eq!(resp.access_token, "at2");
    assert_eq!(resp.refresh_token.as_deref(), Some("rt2"));
}
