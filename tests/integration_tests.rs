use auction_marketplace::accounts;
use auction_marketplace::database::DatabaseManager;
use auction_marketplace::query;
use axum::http::StatusCode;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const BASE_URL: &str = "http://localhost:3000";

/// 트레이싱 초기화
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("트레이싱 구독자 설정 실패");
}

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new().await)
}

/// 테스트 클라이언트 생성 (302 를 따라가지 않고 세션 쿠키 유지)
fn test_client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .expect("클라이언트 생성 실패")
}

/// 재실행 간 충돌을 피하는 사용자명 생성
fn unique_username(base: &str) -> String {
    format!("{}_{}", base, Utc::now().timestamp_millis())
}

/// 회원 가입 (302 확인, 세션 쿠키는 클라이언트에 저장됨)
async fn register(client: &Client, username: &str) {
    let response = client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": "",
            "password": "pass1234",
            "confirmation": "pass1234"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/");
}

/// 상품 등록 (302 확인)
async fn create_listing(client: &Client, item: &str, starting_bid: f64, category: Option<&str>) {
    let mut body = json!({ "item": item, "starting_bid": starting_bid });
    if let Some(category) = category {
        body["category"] = json!(category);
    }

    let response = client
        .post(format!("{}/create", BASE_URL))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/");
}

/// 사용자 id 조회
async fn find_user_id(db_manager: &DatabaseManager, username: &str) -> i64 {
    accounts::find_user_by_username(db_manager, username)
        .await
        .unwrap()
        .expect("사용자가 존재해야 함")
        .id
}

/// 판매자의 가장 최근 상품 id 조회
async fn latest_listing_id(db_manager: &DatabaseManager, seller_id: i64) -> i64 {
    query::handlers::get_listings_by_seller(db_manager, seller_id)
        .await
        .unwrap()
        .first()
        .expect("상품이 존재해야 함")
        .id
}

/// 입찰 요청 전송
async fn place_bid(client: &Client, listing_id: i64, bid: f64) -> reqwest::Response {
    client
        .post(format!("{}/listing/{}", BASE_URL, listing_id))
        .json(&json!({ "bid": bid }))
        .send()
        .await
        .expect("Failed to send request")
}

/// 상세 액션 요청 전송 (Close / Watchlist / comment)
async fn post_action(client: &Client, listing_id: i64, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/listing/{}", BASE_URL, listing_id))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request")
}

/// 입찰 로그 조회 (오래된 순)
async fn bid_amounts(db_manager: &DatabaseManager, listing_id: i64) -> Vec<Decimal> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, Decimal>(
                    "SELECT amount FROM bids WHERE listing_id = $1 ORDER BY id",
                )
                .bind(listing_id)
                .fetch_all(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 회원 가입, 세션 쿠키, 로그아웃 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_register_login_logout_session() {
    let client = test_client();
    let username = unique_username("session_user");

    // 가입 직후 세션 쿠키로 보호된 페이지 접근 가능
    register(&client, &username).await;
    let response = client
        .get(format!("{}/watchlist", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    // 로그아웃 후에는 401
    let response = client
        .get(format!("{}/logout", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FOUND);

    let response = client
        .get(format!("{}/watchlist", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 로그인으로 세션 재발급, Bearer 헤더로도 인증 가능
    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": username, "password": "pass1234" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FOUND);

    let set_cookie = response.headers()["set-cookie"].to_str().unwrap();
    let token = set_cookie
        .trim_start_matches("session=")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let bare_client = Client::new();
    let response = bare_client
        .get(format!("{}/watchlist", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}

/// 비밀번호 확인 불일치 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_register_password_mismatch() {
    let db_manager = setup().await;
    let client = test_client();
    let username = unique_username("mismatch_user");

    let response = client
        .post(format!("{}/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": "",
            "password": "pass",
            "confirmation": "notpass"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Passwords must match.");
    assert_eq!(body["code"], "VALIDATION");

    // 사용자 행이 생기지 않아야 함
    let user = accounts::find_user_by_username(&db_manager, &username)
        .await
        .unwrap();
    assert!(user.is_none());
}

/// 로그인 실패 응답 동일성 테스트
/// 잘못된 비밀번호와 미존재 사용자는 구분 불가능한 응답을 받아야 함
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_login_failures_are_indistinguishable() {
    let client = test_client();
    let username = unique_username("login_user");
    register(&client, &username).await;

    let wrong_password = test_client()
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": username, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");
    let unknown_user = test_client()
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "username": unique_username("ghost"), "password": "pass1234" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a = wrong_password.text().await.unwrap();
    let b = unknown_user.text().await.unwrap();
    assert_eq!(a, b);
    let body: Value = serde_json::from_str(&a).unwrap();
    assert_eq!(body["error"], "Invalid username and/or password.");
    assert_eq!(body["code"], "CREDENTIAL_MISMATCH");
}

/// 사용자명 중복 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_register_duplicate_username() {
    let client = test_client();
    let username = unique_username("dup_user");
    register(&client, &username).await;

    let response = test_client()
        .post(format!("{}/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": "",
            "password": "pass1234",
            "confirmation": "pass1234"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Username already taken.");
    assert_eq!(body["code"], "USERNAME_TAKEN");
}

/// 입찰 사다리 시나리오 테스트
/// 시작가 34.99: 30.00 거절, 35.00 수락, 35.00 거절, 40.00 수락, 종료 후 1000.00 거절
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_bid_ladder_and_close() {
    let db_manager = setup().await;
    let seller = test_client();
    let bidder1 = test_client();
    let bidder2 = test_client();

    let seller_name = unique_username("ladder_seller");
    let bidder1_name = unique_username("ladder_bidder1");
    let bidder2_name = unique_username("ladder_bidder2");
    register(&seller, &seller_name).await;
    register(&bidder1, &bidder1_name).await;
    register(&bidder2, &bidder2_name).await;

    create_listing(&seller, "입찰 사다리 테스트 램프", 34.99, None).await;
    let seller_id = find_user_id(&db_manager, &seller_name).await;
    let listing_id = latest_listing_id(&db_manager, seller_id).await;

    // 시작가 이하 거절
    let response = place_bid(&bidder1, listing_id, 30.00).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "BID_TOO_LOW");
    assert_eq!(body["error"], "Bid must exceed starting bid and current bid");

    // 첫 수락
    let response = place_bid(&bidder1, listing_id, 35.00).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        format!("/listing/{}", listing_id)
    );

    // 현재 입찰가 이하 거절 (코드로 구분 가능해야 함)
    let response = place_bid(&bidder2, listing_id, 35.00).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "BID_BELOW_CURRENT");
    assert_eq!(body["error"], "Bid must exceed current");

    // 두 번째 수락
    let response = place_bid(&bidder2, listing_id, 40.00).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let detail = query::handlers::get_listing_detail(&db_manager, listing_id)
        .await
        .unwrap()
        .unwrap();
    let expected: Decimal = "40.00".parse().unwrap();
    assert_eq!(detail.current_amount, Some(expected));
    assert_eq!(detail.current_bidder.as_deref(), Some(bidder2_name.as_str()));

    // 판매자가 아니면 종료 불가
    let response = post_action(&bidder1, listing_id, json!({ "button": "Close" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_SELLER");

    // 판매자 종료, 반복 종료는 멱등
    let response = post_action(&seller, listing_id, json!({ "button": "Close" })).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let response = post_action(&seller, listing_id, json!({ "button": "Close" })).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    // 종료 후에는 금액과 무관하게 거절
    let response = place_bid(&bidder1, listing_id, 1000.00).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "AUCTION_CLOSED");

    // 낙찰자 플래그: 현재 입찰자에게만 true
    let body: Value = bidder2
        .get(format!("{}/listing/{}", BASE_URL, listing_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .unwrap();
    assert_eq!(body["closed"], true);
    assert_eq!(body["winner"], true);

    let body: Value = bidder1
        .get(format!("{}/listing/{}", BASE_URL, listing_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .unwrap();
    assert_eq!(body["winner"], false);

    let body: Value = seller
        .get(format!("{}/listing/{}", BASE_URL, listing_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .unwrap();
    assert_eq!(body["seller"], true);
    assert_eq!(body["winner"], false);

    // 수락된 입찰 로그는 단조 증가
    let amounts = bid_amounts(&db_manager, listing_id).await;
    assert_eq!(amounts.len(), 2);
    assert!(amounts.windows(2).all(|w| w[0] < w[1]));
}

/// 판매자 본인 입찰 거절 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_self_bid_rejected() {
    let db_manager = setup().await;
    let seller = test_client();
    let seller_name = unique_username("self_bid_seller");
    register(&seller, &seller_name).await;

    create_listing(&seller, "본인 입찰 테스트 의자", 10.00, None).await;
    let seller_id = find_user_id(&db_manager, &seller_name).await;
    let listing_id = latest_listing_id(&db_manager, seller_id).await;

    let response = place_bid(&seller, listing_id, 20.00).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SELF_BID");

    assert!(bid_amounts(&db_manager, listing_id).await.is_empty());
}

/// 관심 목록 토글 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_watchlist_toggle() {
    let db_manager = setup().await;
    let seller = test_client();
    let watcher = test_client();
    let seller_name = unique_username("watch_seller");
    let watcher_name = unique_username("watcher");
    register(&seller, &seller_name).await;
    register(&watcher, &watcher_name).await;

    create_listing(&seller, "관심 목록 테스트 시계", 15.00, None).await;
    let seller_id = find_user_id(&db_manager, &seller_name).await;
    let watcher_id = find_user_id(&db_manager, &watcher_name).await;
    let listing_id = latest_listing_id(&db_manager, seller_id).await;

    // 토글 on
    let response = post_action(&watcher, listing_id, json!({ "button": "Watchlist" })).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(query::handlers::is_watched(&db_manager, watcher_id, listing_id)
        .await
        .unwrap());

    // 관심 목록 페이지에 노출
    let body: Value = watcher
        .get(format!("{}/watchlist", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .unwrap();
    assert_eq!(body["watchlist"][0]["id"], listing_id);

    // 토글 off
    let response = post_action(&watcher, listing_id, json!({ "button": "Watchlist" })).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(!query::handlers::is_watched(&db_manager, watcher_id, listing_id)
        .await
        .unwrap());
}

/// 댓글 작성 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_comments() {
    let db_manager = setup().await;
    let seller = test_client();
    let commenter = test_client();
    let seller_name = unique_username("comment_seller");
    let commenter_name = unique_username("commenter");
    register(&seller, &seller_name).await;
    register(&commenter, &commenter_name).await;

    create_listing(&seller, "댓글 테스트 책상", 25.00, None).await;
    let seller_id = find_user_id(&db_manager, &seller_name).await;
    let listing_id = latest_listing_id(&db_manager, seller_id).await;

    // 정상 댓글
    let response = post_action(
        &commenter,
        listing_id,
        json!({ "button": "comment", "comment": "상태가 궁금합니다." }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let comments = query::handlers::get_listing_comments(&db_manager, listing_id)
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author, commenter_name);
    assert_eq!(comments[0].body, "상태가 궁금합니다.");

    // 빈 댓글 거절
    let response = post_action(
        &commenter,
        listing_id,
        json!({ "button": "comment", "comment": "  " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION");
}

/// 미로그인 POST 거절 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_anonymous_post_rejected() {
    let db_manager = setup().await;
    let seller = test_client();
    let seller_name = unique_username("anon_seller");
    register(&seller, &seller_name).await;

    create_listing(&seller, "익명 테스트 화분", 5.00, None).await;
    let seller_id = find_user_id(&db_manager, &seller_name).await;
    let listing_id = latest_listing_id(&db_manager, seller_id).await;

    // 익명 조회는 가능하고 플래그는 모두 false
    let anonymous = Client::new();
    let body: Value = anonymous
        .get(format!("{}/listing/{}", BASE_URL, listing_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .unwrap();
    assert_eq!(body["watched"], false);
    assert_eq!(body["seller"], false);
    assert_eq!(body["winner"], false);

    // 익명 변이는 401
    let response = anonymous
        .post(format!("{}/listing/{}", BASE_URL, listing_id))
        .json(&json!({ "bid": 50.00 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "You must be logged in");
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

/// 카테고리 페이지 테스트
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_category_pages() {
    let db_manager = setup().await;
    let seller = test_client();
    let seller_name = unique_username("category_seller");
    register(&seller, &seller_name).await;

    let item_name = format!("카테고리 테스트 장난감 {}", Utc::now().timestamp_millis());
    create_listing(&seller, &item_name, 12.00, Some("Toys")).await;
    let seller_id = find_user_id(&db_manager, &seller_name).await;
    let listing_id = latest_listing_id(&db_manager, seller_id).await;

    // 카테고리 목록에는 시드된 여섯 개가 그대로
    let body: Value = seller
        .get(format!("{}/categories", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["Home", "Electronics", "Toys", "Fashion", "Misc", "Other"]
    );

    // 해당 카테고리 페이지에는 노출, 다른 카테고리에는 미노출
    let toys = query::handlers::get_listings_by_category(&db_manager, "Toys")
        .await
        .unwrap();
    assert!(toys.iter().any(|l| l.id == listing_id));

    let fashion = query::handlers::get_listings_by_category(&db_manager, "Fashion")
        .await
        .unwrap();
    assert!(fashion.iter().all(|l| l.id != listing_id));

    // 미등록 카테고리는 빈 목록
    let body: Value = seller
        .get(format!("{}/categories/NoSuchCategory", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .unwrap();
    assert_eq!(body["listings"].as_array().unwrap().len(), 0);

    // 등록 카테고리만 허용
    let response = seller
        .post(format!("{}/create", BASE_URL))
        .json(&json!({
            "item": "잘못된 카테고리 상품",
            "starting_bid": 10.00,
            "category": "NoSuchCategory"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// 동시성 입찰 테스트
/// 서로 다른 금액의 동시 입찰이 모두 끝나면 최고 금액이 남고 로그는 단조 증가
#[tokio::test]
#[ignore = "실행 중인 서버와 데이터베이스 필요"]
async fn test_concurrent_bidding() {
    // 테스트 시작 시 tracing 초기화
    init_tracing();

    let db_manager = setup().await;
    let seller = test_client();
    let bidder = test_client();
    let seller_name = unique_username("race_seller");
    let bidder_name = unique_username("race_bidder");
    register(&seller, &seller_name).await;
    register(&bidder, &bidder_name).await;

    create_listing(&seller, "동시성 입찰 테스트 카메라", 35.00, None).await;
    let seller_id = find_user_id(&db_manager, &seller_name).await;
    let listing_id = latest_listing_id(&db_manager, seller_id).await;

    // 20개의 동시 입찰 생성 (36.00 ~ 55.00)
    let mut handles = vec![];
    for i in 1..=20 {
        let client = bidder.clone();
        let amount = 35.0 + i as f64;

        let handle = tokio::spawn(async move {
            let response = client
                .post(format!("{}/listing/{}", BASE_URL, listing_id))
                .json(&json!({ "bid": amount }))
                .send()
                .await
                .unwrap();

            let status = response.status();
            let body = response.text().await.unwrap();
            (status, body)
        });

        handles.push(handle);
    }

    // 모든 입찰 처리 대기 및 결과 확인
    let mut successful_bids: usize = 0;
    let mut failed_bids: usize = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();

        if status == StatusCode::FOUND {
            successful_bids += 1;
        } else {
            let error_info: Value = serde_json::from_str(&body).unwrap();
            if error_info["code"] == "MAX_RETRIES_EXCEEDED" {
                panic!("최대 재시도 횟수 초과 오류 발생: {:?}", error_info);
            }
            assert_eq!(error_info["code"], "BID_BELOW_CURRENT");
            failed_bids += 1;
        }
    }
    info!(
        "성공한 입찰 수: {}, 실패한 입찰 수: {}",
        successful_bids, failed_bids
    );
    assert!(successful_bids >= 1);

    // 최고 금액 입찰은 재시도 끝에 반드시 수락됨
    let top: Decimal = "55.00".parse().unwrap();
    let detail = query::handlers::get_listing_detail(&db_manager, listing_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.current_amount, Some(top));

    // 수락된 입찰 로그는 단조 증가, 마지막 행이 현재 입찰
    let amounts = bid_amounts(&db_manager, listing_id).await;
    assert_eq!(amounts.len(), successful_bids);
    assert!(amounts.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(amounts.last(), Some(&top));
}
