use std::{net::SocketAddr, sync::Arc};

use edutwin_auth::{
    build_api_route_filter, handle_auth_errors, password, with_auth, with_optional_auth, Auth,
    AuthConfig, AuthError, ConfigError, Email, InMemoryDirectory, TopicStatus, User,
    UserDirectory, UserID,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use warp::{path, Filter, Rejection};

#[derive(Deserialize)]
struct ProgressUpdate {
    topic_id: String,
    status: TopicStatus,
    score: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match AuthConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingSecret) => {
            warn!("JWT_SECRET_KEY is not set, falling back to an insecure development secret");
            AuthConfig::new("insecure development secret")
        }
        Err(e) => return Err(e.into()),
    };

    let mut alex = User::new(
        UserID("user-1".into()),
        "Alex Johnson".into(),
        Email("alex@edutwin.com".into()),
        password::hash("password123")?,
    );
    alex.completed_topics = vec!["topic-1".into()];
    alex.in_progress_topics = vec!["topic-2".into()];
    alex.pending_topics = vec!["topic-3".into(), "topic-4".into(), "topic-5".into()];
    alex.total_score = 85;
    alex.rank = 1;

    let directory = Arc::new(InMemoryDirectory::with_users([alex]));
    let auth = Auth::new(config, directory.clone())?;

    let auth_routes = build_api_route_filter(&auth);

    let unsecured_homepage =
        warp::path::end().then(|| async move { warp::reply::html("hello, world!") });

    let secure_page = path!("check_user_id")
        .and(with_auth(&auth))
        .then(|user: User| async move { warp::reply::json(&json!({ "user id": user.id })) });

    let greeting = path!("greeting")
        .and(with_optional_auth(&auth))
        .then(|user_id: Option<UserID>| async move {
            let who = user_id.map(|id| id.0).unwrap_or_else(|| "guest".into());
            warp::reply::json(&json!({ "hello": who }))
        });

    let progress = path!("progress")
        .and(warp::post())
        .and(with_auth(&auth))
        .and(warp::body::json())
        .and_then(move |user: User, update: ProgressUpdate| {
            let directory = directory.clone();
            async move {
                let updated = directory
                    .update_user_progress(&user.id, &update.topic_id, update.status, update.score)
                    .await
                    .map_err(AuthError::from)?;
                Ok::<_, Rejection>(warp::reply::json(&json!({ "success": updated })))
            }
        });

    let all_routes = unsecured_homepage
        .or(secure_page)
        .or(greeting)
        .or(progress)
        .or(auth_routes)
        .recover(handle_auth_errors);

    warp::serve(all_routes)
        .run("127.0.0.1:4000".parse::<SocketAddr>()?)
        .await;

    Ok(())
}
