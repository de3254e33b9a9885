mod common;

use axum::http::StatusCode;
use common::{get, read_json, spawn_app, test_config};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_search(server: &MockServer, query: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("query", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [
                {
                    "id": 603,
                    "title": "The Matrix",
                    "overview": "A hacker learns the truth.",
                    "poster_path": "/matrix.jpg",
                    "backdrop_path": "/matrix-bg.jpg",
                    "release_date": "1999-03-30",
                    "genre_ids": [28, 878]
                },
                {
                    "id": 604,
                    "title": "The Matrix Reloaded",
                    "overview": null,
                    "poster_path": null,
                    "release_date": "2003-05-15",
                    "genre_ids": [12, 28]
                }
            ]
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_movie(server: &MockServer, id: i64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/movie/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_enrichment(server: &MockServer) {
    mount_movie(
        server,
        603,
        json!({
            "id": 603,
            "vote_average": 8.2,
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "runtime": 136,
            "tagline": "Welcome to the Real World."
        }),
    )
    .await;
    mount_movie(
        server,
        604,
        json!({
            "id": 604,
            "vote_average": 7.0,
            "genres": [{"id": 12, "name": "Adventure"}],
            "runtime": 138,
            "tagline": ""
        }),
    )
    .await;
}

#[tokio::test]
async fn test_search_enriches_and_serves_repeat_from_cache() {
    let server = MockServer::start().await;
    mount_search(&server, "matrix", 1).await;
    mount_enrichment(&server).await;

    let (app, _) = spawn_app(test_config(Some(&server.uri()))).await;

    let (status, first) = read_json(get(&app, "/api/movies/search?query=matrix").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);

    let movies = first["data"].as_array().unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["id"], 603);
    assert_eq!(movies[0]["rating"], 8.2);
    assert_eq!(movies[0]["runtime"], 136);
    assert_eq!(movies[0]["genres"], json!(["Action", "Science Fiction"]));
    assert_eq!(movies[0]["tagline"], "Welcome to the Real World.");
    assert_eq!(
        movies[0]["poster"],
        "https://image.tmdb.org/t/p/w500/matrix.jpg"
    );
    assert!(movies[1]["poster"].is_null());
    assert!(movies[1]["tagline"].is_null());

    let (status, second) = read_json(get(&app, "/api/movies/search?query=matrix").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    // MockServer verifies the single provider search call on drop
}

#[tokio::test]
async fn test_enrichment_failure_keeps_movie() {
    let server = MockServer::start().await;
    mount_search(&server, "reloaded", 1).await;
    mount_movie(
        &server,
        603,
        json!({ "id": 603, "vote_average": 8.2, "genres": [], "runtime": 136 }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/movie/604"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (app, _) = spawn_app(test_config(Some(&server.uri()))).await;

    let (status, body) = read_json(get(&app, "/api/movies/search?query=reloaded").await).await;
    assert_eq!(status, StatusCode::OK);

    let movies = body["data"].as_array().unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[1]["title"], "The Matrix Reloaded");
    assert!(movies[1]["rating"].is_null());
    assert!(movies[1]["genres"].is_null());
    assert!(movies[1]["runtime"].is_null());
}

#[tokio::test]
async fn test_unrated_cache_entry_is_refetched() {
    let server = MockServer::start().await;
    mount_search(&server, "matrix", 2).await;
    Mock::given(method("GET"))
        .and(path("/movie/603"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_movie(
        &server,
        604,
        json!({ "id": 604, "vote_average": 7.0, "genres": [], "runtime": 138 }),
    )
    .await;

    let (app, _) = spawn_app(test_config(Some(&server.uri()))).await;

    for _ in 0..2 {
        let (status, body) = read_json(get(&app, "/api/movies/search?query=matrix").await).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"][0]["rating"].is_null());
        assert_eq!(body["data"][1]["rating"], 7.0);
    }

    // Both searches reached the provider: verified on drop by `.expect(2)`
}

#[tokio::test]
async fn test_genre_filter() {
    let server = MockServer::start().await;
    mount_search(&server, "matrix", 1).await;
    mount_enrichment(&server).await;

    let (app, _) = spawn_app(test_config(Some(&server.uri()))).await;

    let (status, body) =
        read_json(get(&app, "/api/movies/search?query=matrix&genre=878").await).await;
    assert_eq!(status, StatusCode::OK);

    let movies = body["data"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["id"], 603);
}

#[tokio::test]
async fn test_invalid_genre_filter() {
    let (app, _) = spawn_app(test_config(None)).await;

    let (status, body) =
        read_json(get(&app, "/api/movies/search?query=matrix&genre=action").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");
}

#[tokio::test]
async fn test_search_requires_query() {
    let (app, _) = spawn_app(test_config(None)).await;

    for uri in ["/api/movies/search", "/api/movies/search?query=%20%20"] {
        let (status, body) = read_json(get(&app, uri).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "validation");
        assert_eq!(body["error"]["message"], "Query is required");
    }
}

#[tokio::test]
async fn test_missing_api_key_is_internal_error() {
    let (app, _) = spawn_app(test_config(None)).await;

    let (status, body) = read_json(get(&app, "/api/movies/search?query=dune").await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "internal");
}

#[tokio::test]
async fn test_movie_details_are_decorated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/603"))
        .and(query_param("append_to_response", "videos,credits,images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 603,
            "title": "The Matrix",
            "poster_path": "/matrix.jpg",
            "backdrop_path": "/matrix-bg.jpg",
            "credits": {"cast": [{"name": "Keanu Reeves"}]},
            "videos": {"results": [
                {"key": "trailer1", "site": "YouTube", "type": "Trailer"},
                {"key": "teaser1", "site": "YouTube", "type": "Teaser"},
                {"key": "vimeo1", "site": "Vimeo", "type": "Trailer"}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = spawn_app(test_config(Some(&server.uri()))).await;

    let (status, body) = read_json(get(&app, "/api/movies/details/603").await).await;
    assert_eq!(status, StatusCode::OK);

    let detail = &body["data"];
    assert_eq!(detail["title"], "The Matrix");
    assert_eq!(detail["credits"]["cast"][0]["name"], "Keanu Reeves");
    assert_eq!(
        detail["poster_path_full"],
        "https://image.tmdb.org/t/p/w500/matrix.jpg"
    );
    assert_eq!(
        detail["backdrop_path_full"],
        "https://image.tmdb.org/t/p/original/matrix-bg.jpg"
    );

    let trailers = detail["trailers"].as_array().unwrap();
    assert_eq!(trailers.len(), 1);
    assert_eq!(trailers[0]["key"], "trailer1");
}

#[tokio::test]
async fn test_movie_details_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status_code": 34,
            "status_message": "The resource you requested could not be found."
        })))
        .mount(&server)
        .await;

    let (app, _) = spawn_app(test_config(Some(&server.uri()))).await;

    let (status, body) = read_json(get(&app, "/api/movies/details/999999").await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");
}

#[tokio::test]
async fn test_movie_details_rejects_bad_ids() {
    let (app, _) = spawn_app(test_config(None)).await;

    for uri in ["/api/movies/details/abc", "/api/movies/details/0"] {
        let (status, body) = read_json(get(&app, uri).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "validation");
    }
}

#[tokio::test]
async fn test_genres_passthrough() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [{"id": 28, "name": "Action"}, {"id": 35, "name": "Comedy"}]
        })))
        .mount(&server)
        .await;

    let (app, _) = spawn_app(test_config(Some(&server.uri()))).await;

    let (status, body) = read_json(get(&app, "/api/movies/genres").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([{"id": 28, "name": "Action"}, {"id": 35, "name": "Comedy"}])
    );
}

#[tokio::test]
async fn test_provider_failure_is_external_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (app, _) = spawn_app(test_config(Some(&server.uri()))).await;

    let (status, body) = read_json(get(&app, "/api/movies/search?query=dune").await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["kind"], "external_api");
}
