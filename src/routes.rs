use std::convert::Infallible;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use warp::{
    http::header::{CONTENT_TYPE, WWW_AUTHENTICATE},
    hyper::{Response, StatusCode},
    path, Filter, Rejection, Reply,
};

use crate::{
    auth::Auth,
    error::AuthError,
    password,
    types::{Email, User, UserID, UserProfile},
};

pub fn build_api_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let signup = path!("auth" / "signup")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.clone()))
        .and_then(user_signup);

    let login = path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.clone()))
        .and_then(user_login);

    let logout = path!("auth" / "logout")
        .and(warp::post())
        .and(with_auth(auth))
        .map(user_logout);

    let me = path!("auth" / "me")
        .and(warp::get())
        .and(with_auth(auth))
        .map(|user: User| warp::reply::json(&user.profile()));

    let refresh = path!("auth" / "refresh")
        .and(warp::post())
        .and(with_auth(auth))
        .and(with_auth_state(auth.clone()))
        .and_then(token_refresh);

    signup.or(login).or(logout).or(me).or(refresh)
}

/// Require a valid bearer token and extract the user it was issued to.
pub fn with_auth(auth: &Auth) -> impl Filter<Extract = (User,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_auth_state(auth.clone()))
        .and_then(user_auth_check)
}

/// Extract the caller's id when a usable bearer token is present, `None` otherwise.
pub fn with_optional_auth(
    auth: &Auth,
) -> impl Filter<Extract = (Option<UserID>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_auth_state(auth.clone()))
        .and_then(optional_auth_check)
}

pub async fn handle_auth_errors(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(auth_error) = err.find::<AuthError>() {
        let (status, message) = match &auth_error {
            AuthError::Unauthenticated | AuthError::LoginFailed => {
                (StatusCode::UNAUTHORIZED, auth_error.to_string())
            }
            AuthError::EmailAlreadyTaken => (StatusCode::CONFLICT, auth_error.to_string()),
            AuthError::InvalidInput { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, auth_error.to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "an unknown error has occurred".to_string(),
            ),
        };

        let mut response = Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json");
        if matches!(auth_error, AuthError::Unauthenticated) {
            response = response.header(WWW_AUTHENTICATE, "Bearer");
        }

        return Ok(response.body(json!({ "detail": message }).to_string()));
    }

    Err(err)
}

#[derive(Debug, Deserialize)]
pub struct SignupQuery {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

async fn user_signup(input: SignupQuery, auth: Auth) -> Result<impl Reply, Rejection> {
    validate_signup(&input)?;

    let new_user_id = UserID(Uuid::new_v4().to_string());
    let hashed_password = password::hash(&input.password).map_err(AuthError::from)?;

    let mut user = User::new(
        new_user_id.clone(),
        input.name.trim().to_string(),
        Email(input.email),
        hashed_password,
    );
    user.pending_topics = vec!["topic-1".into(), "topic-2".into()];
    let now = Utc::now().to_rfc3339();
    user.created_at = Some(now.clone());
    user.updated_at = Some(now);

    let user_id = auth
        .directory()
        .create_user_if_not_exists(user)
        .await
        .map_err(AuthError::from)?;

    if user_id != new_user_id {
        return Err(AuthError::EmailAlreadyTaken.into());
    }

    let user = auth
        .directory()
        .lookup_by_id(&user_id)
        .await
        .map_err(AuthError::from)?
        .ok_or_else(|| AuthError::DirectoryError {
            source: "newly created user could not be read back".into(),
        })?;

    info!(user_id = %user.id, "registered new user");

    Ok(warp::reply::json(&auth_token(&auth, &user)?))
}

async fn user_login(input: LoginQuery, auth: Auth) -> Result<impl Reply, Rejection> {
    validate_login(&input)?;

    let user = auth
        .directory()
        .lookup_by_email(&Email(input.email))
        .await
        .map_err(AuthError::from)?;

    // unknown email and wrong password are indistinguishable to the caller, timing included
    let verified = match &user {
        Some(user) => password::verify(&input.password, &user.hashed_password),
        None => password::verify_dummy(&input.password),
    };
    let user = match user {
        Some(user) if verified => user,
        _ => return Err(AuthError::LoginFailed.into()),
    };

    info!(user_id = %user.id, "user logged in");

    Ok(warp::reply::json(&auth_token(&auth, &user)?))
}

fn user_logout(_user: User) -> impl Reply {
    warp::reply::json(&SuccessResponse {
        success: true,
        message: "Logged out successfully".into(),
    })
}

async fn token_refresh(user: User, auth: Auth) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&auth_token(&auth, &user)?))
}

fn auth_token(auth: &Auth, user: &User) -> Result<AuthToken, AuthError> {
    Ok(AuthToken {
        access_token: auth.issue_token(&user.id)?,
        token_type: "bearer".into(),
        expires_in: auth.token_lifetime().as_secs(),
        user: user.profile(),
    })
}

fn validate_signup(input: &SignupQuery) -> Result<(), AuthError> {
    let name_len = input.name.trim().chars().count();
    if !(2..=50).contains(&name_len) {
        return Err(AuthError::InvalidInput {
            field: "name",
            reason: "must be between 2 and 50 characters",
        });
    }

    if !looks_like_email(&input.email) {
        return Err(AuthError::InvalidInput {
            field: "email",
            reason: "must look like name@domain.tld",
        });
    }

    let password_len = input.password.chars().count();
    if !(6..=100).contains(&password_len) {
        return Err(AuthError::InvalidInput {
            field: "password",
            reason: "must be between 6 and 100 characters",
        });
    }

    Ok(())
}

fn validate_login(input: &LoginQuery) -> Result<(), AuthError> {
    if !looks_like_email(&input.email) {
        return Err(AuthError::InvalidInput {
            field: "email",
            reason: "must look like name@domain.tld",
        });
    }

    if input.password.is_empty() {
        return Err(AuthError::InvalidInput {
            field: "password",
            reason: "must not be empty",
        });
    }

    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

// Unwrap the bearer token and resolve it to a user
async fn user_auth_check(authorization: Option<String>, auth: Auth) -> Result<User, Rejection> {
    Ok(auth.authorize(authorization.as_deref()).await?)
}

async fn optional_auth_check(
    authorization: Option<String>,
    auth: Auth,
) -> Result<Option<UserID>, Rejection> {
    Ok(auth.authorize_optional(authorization.as_deref()).await?)
}

// functor that adds a handle to the auth gate into the filter chain
fn with_auth_state(auth: Auth) -> impl Filter<Extract = (Auth,), Error = Infallible> + Clone {
    warp::any().map(move || auth.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("alex@edutwin.com"));
        assert!(looks_like_email("a.b@c.d.e"));
        assert!(!looks_like_email("alex"));
        assert!(!looks_like_email("@edutwin.com"));
        assert!(!looks_like_email("alex@edutwin"));
        assert!(!looks_like_email("alex@.com"));
        assert!(!looks_like_email("alex@edutwin."));
        assert!(!looks_like_email("a@b@c.com"));
    }

    #[test]
    fn signup_validation() {
        let query = |name: &str, email: &str, password: &str| SignupQuery {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };

        assert!(validate_signup(&query("Sam", "sam@edutwin.com", "foobar")).is_ok());
        assert!(matches!(
            validate_signup(&query("S", "sam@edutwin.com", "foobar")),
            Err(AuthError::InvalidInput { field: "name", .. })
        ));
        assert!(matches!(
            validate_signup(&query("Sam", "sam", "foobar")),
            Err(AuthError::InvalidInput { field: "email", .. })
        ));
        assert!(matches!(
            validate_signup(&query("Sam", "sam@edutwin.com", "foo")),
            Err(AuthError::InvalidInput {
                field: "password",
                ..
            })
        ));
    }

    #[test]
    fn login_validation() {
        let query = |email: &str, password: &str| LoginQuery {
            email: email.into(),
            password: password.into(),
        };

        assert!(validate_login(&query("alex@edutwin.com", "x")).is_ok());
        assert!(matches!(
            validate_login(&query("alex", "password123")),
            Err(AuthError::InvalidInput { field: "email", .. })
        ));
        assert!(matches!(
            validate_login(&query("alex@edutwin.com", "")),
            Err(AuthError::InvalidInput {
                field: "password",
                ..
            })
        ));
    }
}
