use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use cowchips_core::users::{Location, NewUser, UserRepositoryTrait};
use cowchips_server::{api::app_router, build_state, config::Config};
use cowchips_storage_sqlite::{db, UserRepository};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

struct TestApp {
    _tmp: TempDir,
    users: UserRepository,
    router: Router,
}

async fn build_test_app() -> TestApp {
    let tmp = tempdir().unwrap();
    let mut config = Config::from_env().unwrap();
    config.db_path = tmp.path().join("test.db").to_string_lossy().to_string();
    config.mail.endpoint = None;
    let state = build_state(&config).await.unwrap();
    let router = app_router(state, &config);
    // Users have no HTTP surface; seed them straight into the same database.
    let pool = db::create_pool(&config.db_path).unwrap();
    let users = UserRepository::new(pool.clone(), db::spawn_writer(pool));
    TestApp {
        _tmp: tmp,
        users,
        router,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn add_user(&self, id: &str, zip: Option<&str>) {
        self.users
            .insert_new_user(NewUser {
                id: Some(id.to_string()),
                name: format!("Donor {}", id),
                email: format!("{}@example.org", id),
                phone: None,
                location: Some(Location {
                    address: Some("9 Dairy Rd".to_string()),
                    city: Some("Madison".to_string()),
                    state: Some("WI".to_string()),
                    zip: zip.map(str::to_string),
                }),
            })
            .await
            .unwrap();
    }

    async fn create_game(&self) -> String {
        let now = Utc::now();
        let (status, game) = self
            .call(
                Method::POST,
                "/api/v1/games",
                None,
                Some(json!({
                    "name": "Homecoming Cow Chip Bingo",
                    "organizationIds": ["org1"],
                    "startTime": now - Duration::hours(1),
                    "endTime": now + Duration::hours(1),
                    "board": (1..=12).collect::<Vec<i32>>(),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        game["id"].as_str().unwrap().to_string()
    }

    async fn donate(&self, user: &str, game_id: &str, tiles: Vec<i32>) -> (StatusCode, Value) {
        let amount = 100 * tiles.len() as i64;
        self.call(
            Method::POST,
            "/api/v1/donations",
            Some(user),
            Some(json!({
                "amount": amount,
                "currency": "usd",
                "source": format!("ch_{}", user),
                "organizationId": "org1",
                "gameId": game_id,
                "tiles": tiles,
            })),
        )
        .await
    }
}

#[tokio::test]
async fn finalize_lists_winners_and_rejects_second_tile() {
    let app = build_test_app().await;
    app.add_user("u1", Some("53703")).await;
    app.add_user("u2", Some("53703")).await;
    app.add_user("u3", None).await;
    let game_id = app.create_game().await;

    assert_eq!(app.donate("u1", &game_id, vec![7, 8]).await.0, StatusCode::CREATED);
    assert_eq!(app.donate("u2", &game_id, vec![7]).await.0, StatusCode::CREATED);
    assert_eq!(app.donate("u3", &game_id, vec![7, 1]).await.0, StatusCode::CREATED);

    let (status, game) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/games/{}/winning-tile", game_id),
            None,
            Some(json!({ "tile": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(game["winningTile"], 7);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/games/{}/winning-tile", game_id),
            None,
            Some(json!({ "tile": 8 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, winners) = app
        .call(
            Method::GET,
            &format!("/api/v1/admin/games/{}/winners", game_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(winners.as_array().unwrap().len(), 3);

    let (status, report) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/games/{}/notify-winners", game_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["winners"], 3);
    assert_eq!(report["winningTile"], 7);
    assert_eq!(report["dispatches"].as_array().unwrap().len(), 2);

    let (status, _) = app.donate("u1", &game_id, vec![2]).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn donation_requires_user_header() {
    let app = build_test_app().await;
    let game_id = app.create_game().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/donations",
            None,
            Some(json!({
                "amount": 100,
                "currency": "usd",
                "source": "ch_1",
                "organizationId": "org1",
                "gameId": game_id,
                "tiles": [1],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn underpaid_donation_is_rejected() {
    let app = build_test_app().await;
    let game_id = app.create_game().await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/donations",
            Some("u1"),
            Some(json!({
                "amount": 150,
                "currency": "usd",
                "source": "ch_1",
                "organizationId": "org1",
                "gameId": game_id,
                "tiles": [1, 2],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_game_and_tile_off_board() {
    let app = build_test_app().await;
    let (status, _) = app.call(Method::GET, "/api/v1/games/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let game_id = app.create_game().await;
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/games/{}/winning-tile", game_id),
            None,
            Some(json!({ "tile": 99 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/games/{}/notify-winners", game_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn active_games_and_donation_delete() {
    let app = build_test_app().await;
    app.add_user("u1", Some("53703")).await;
    let game_id = app.create_game().await;

    let (status, games) = app.call(Method::GET, "/api/v1/games/active", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games[0]["id"], game_id.as_str());

    let (_, donation) = app.donate("u1", &game_id, vec![3]).await;
    let donation_id = donation["id"].as_str().unwrap();

    let uri = format!("/api/v1/admin/donations/{}", donation_id);
    let (status, _) = app.call(Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
