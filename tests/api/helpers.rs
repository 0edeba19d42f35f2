use std::sync::OnceLock;

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};
use booru_comments::authorization::UserRank;
use booru_comments::configuration::{self, DatabaseConfigs};
use booru_comments::startup::{self, Application};
use booru_comments::telemetry;
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::Response;
use serde_json::Value;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

static TRACING: OnceLock<()> = OnceLock::new();

pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let default_filter_level = "info".to_string();
        let subscriber_name = "test".to_string();

        if std::env::var("TEST_LOG").is_ok() {
            let subscriber =
                telemetry::get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
            telemetry::init_subscriber(subscriber);
        } else {
            let subscriber =
                telemetry::get_subscriber(subscriber_name, default_filter_level, std::io::sink);
            telemetry::init_subscriber(subscriber);
        };
    });
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: i64,
    pub user_name: String,
    pub password: String,
    pub rank: UserRank,
}

impl TestUser {
    pub async fn store(rank: UserRank, pool: &PgPool) -> Self {
        let user_name: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        let password = Uuid::new_v4().to_string();

        let salt = SaltString::generate(&mut rand::thread_rng());
        let test_params = Params::new(100, 1, 1, None).unwrap();
        let password_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, test_params)
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (user_name, password_hash, rank)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&user_name)
        .bind(password_hash)
        .bind(rank.as_str())
        .fetch_one(pool)
        .await
        .expect("Failed to store test user");

        Self {
            user_id,
            user_name,
            password,
            rank,
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub api_client: reqwest::Client,
    pub regular_user: TestUser,
}

impl TestApp {
    pub async fn create_user(&self, rank: UserRank) -> TestUser {
        TestUser::store(rank, &self.db_pool).await
    }

    pub async fn create_post(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("INSERT INTO posts (user_id) VALUES ($1) RETURNING id")
            .bind(self.regular_user.user_id)
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to store test post")
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        user: Option<&TestUser>,
    ) -> reqwest::RequestBuilder {
        let builder = self
            .api_client
            .request(method, format!("{}{}", self.address, path));
        match user {
            Some(user) => builder.basic_auth(&user.user_name, Some(&user.password)),
            None => builder,
        }
    }

    pub async fn post_comment(&self, payload: &Value, user: Option<&TestUser>) -> Response {
        self.request(reqwest::Method::POST, "/api/comments", user)
            .json(payload)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn list_comments(&self, query: &[(&str, &str)], user: Option<&TestUser>) -> Response {
        self.request(reqwest::Method::GET, "/api/comments", user)
            .query(query)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_comment(&self, comment_id: i64, user: Option<&TestUser>) -> Response {
        self.request(reqwest::Method::GET, &format!("/api/comment/{comment_id}"), user)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_comment(
        &self,
        comment_id: i64,
        payload: &Value,
        user: Option<&TestUser>,
    ) -> Response {
        self.request(reqwest::Method::PUT, &format!("/api/comment/{comment_id}"), user)
            .json(payload)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_comment_without_body(
        &self,
        comment_id: i64,
        user: Option<&TestUser>,
    ) -> Response {
        self.request(reqwest::Method::PUT, &format!("/api/comment/{comment_id}"), user)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_comment(
        &self,
        comment_id: i64,
        payload: Option<&Value>,
        user: Option<&TestUser>,
    ) -> Response {
        let builder =
            self.request(reqwest::Method::DELETE, &format!("/api/comment/{comment_id}"), user);
        let builder = match payload {
            Some(payload) => builder.json(payload),
            None => builder,
        };
        builder.send().await.expect("Failed to execute request.")
    }

    pub async fn rate_comment(&self, comment_id: i64, score: i16, user: Option<&TestUser>) -> Response {
        self.request(
            reqwest::Method::PUT,
            &format!("/api/comment/{comment_id}/score"),
            user,
        )
        .json(&serde_json::json!({ "score": score }))
        .send()
        .await
        .expect("Failed to execute request.")
    }

    /// Creates a comment on a fresh post as `user` and returns its JSON body.
    pub async fn create_comment(&self, text: &str, user: &TestUser) -> Value {
        let post_id = self.create_post().await;
        let response = self
            .post_comment(&serde_json::json!({ "text": text, "postId": post_id }), Some(user))
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["comment"].clone()
    }

    pub async fn comment_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count comments")
    }
}

pub async fn spawn_app() -> TestApp {
    init_tracing();

    let configuration = {
        let mut c = configuration::get_config().expect("Failed to read configuration.");
        c.database.database_name = Uuid::new_v4().to_string();
        c.application.port = 0;
        c
    };

    configure_database(&configuration.database).await;

    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application.");
    let application_port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    let db_pool = startup::get_connection_pool(&configuration.database);
    let regular_user = TestUser::store(UserRank::Regular, &db_pool).await;

    TestApp {
        address: format!("http://127.0.0.1:{application_port}"),
        db_pool,
        api_client: reqwest::Client::new(),
        regular_user,
    }
}

async fn configure_database(config: &DatabaseConfigs) -> PgPool {
    let maintenance_settings = DatabaseConfigs {
        database_name: "postgres".to_string(),
        ..config.clone()
    };

    let mut connection = PgConnection::connect_with(&maintenance_settings.connect_options())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect_with(config.connect_options())
        .await
        .expect("Failed to connect to Postgres.");

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}
