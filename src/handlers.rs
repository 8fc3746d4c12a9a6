// region:    --- Imports
use crate::accounts::{self, Auth, SESSION_COOKIE};
use crate::auction::is_winner;
use crate::bidding::commands::{
    handle_close_auction, handle_place_bid, CloseAuctionCommand, PlaceBidCommand,
};
use crate::database::DatabaseManager;
use crate::errors::ApiError;
use crate::listing_store::{ListingStore, PostgresListingStore};
use crate::query;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Form Limits

// 폼 입력 한도 (스키마 컬럼 폭과 일치)
const MAX_ITEM_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_IMAGE_URL_LEN: usize = 200;
const MAX_COMMENT_LEN: usize = 500;
const MAX_USERNAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;

// 입찰/시작가 상한과 소수 자릿수
const MAX_AMOUNT: i64 = 1_000_000_000;
const MAX_AMOUNT_SCALE: u32 = 2;

// 입찰 금액 형식 오류 문구
const BID_FORMAT_MESSAGE: &str = "Bid cannot be negative or exceedingly large";

// endregion: --- Form Limits

// region:    --- Forms

/// 로그인 폼
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// 회원 가입 폼
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

impl RegisterForm {
    /// 필수값, 길이, 비밀번호 확인 검증
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::Validation("This field is required.".into()));
        }
        if self.username.chars().count() > MAX_USERNAME_LEN {
            return Err(ApiError::Validation(format!(
                "Ensure this value has at most {} characters.",
                MAX_USERNAME_LEN
            )));
        }
        if self.email.chars().count() > MAX_EMAIL_LEN {
            return Err(ApiError::Validation(format!(
                "Ensure this value has at most {} characters.",
                MAX_EMAIL_LEN
            )));
        }
        if self.password != self.confirmation {
            return Err(ApiError::Validation("Passwords must match.".into()));
        }
        Ok(())
    }
}

/// 상품 등록 폼
#[derive(Debug, Deserialize)]
pub struct NewListingForm {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub description: String,
    pub starting_bid: Option<Decimal>,
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: String,
}

impl NewListingForm {
    /// 필수값, 길이, 시작가 형식 검증, 검증된 시작가 반환
    pub fn validate(&self) -> Result<Decimal, ApiError> {
        if self.item.trim().is_empty() {
            return Err(ApiError::Validation("This field is required.".into()));
        }
        if self.item.chars().count() > MAX_ITEM_LEN {
            return Err(ApiError::Validation(format!(
                "Ensure this value has at most {} characters.",
                MAX_ITEM_LEN
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ApiError::Validation(format!(
                "Ensure this value has at most {} characters.",
                MAX_DESCRIPTION_LEN
            )));
        }
        if self.image_url.chars().count() > MAX_IMAGE_URL_LEN {
            return Err(ApiError::Validation(format!(
                "Ensure this value has at most {} characters.",
                MAX_IMAGE_URL_LEN
            )));
        }

        let starting_bid = self
            .starting_bid
            .ok_or_else(|| ApiError::Validation("This field is required.".into()))?;
        if starting_bid <= Decimal::ZERO
            || starting_bid >= Decimal::from(MAX_AMOUNT)
            || starting_bid.scale() > MAX_AMOUNT_SCALE
        {
            return Err(ApiError::Validation(
                "Starting bid must be a positive amount.".into(),
            ));
        }
        Ok(starting_bid)
    }
}

/// 상품 상세 액션 폼
/// button 값이 Close/Watchlist/comment 분기를 고르고 그 외는 모두 입찰
#[derive(Debug, Deserialize)]
pub struct ListingActionForm {
    pub button: Option<String>,
    pub bid: Option<Decimal>,
    pub comment: Option<String>,
}

impl ListingActionForm {
    /// 입찰 금액 형식 검증
    pub fn bid_amount(&self) -> Result<Decimal, ApiError> {
        let bid = self
            .bid
            .ok_or_else(|| ApiError::Validation(BID_FORMAT_MESSAGE.into()))?;
        if bid <= Decimal::ZERO
            || bid >= Decimal::from(MAX_AMOUNT)
            || bid.scale() > MAX_AMOUNT_SCALE
        {
            return Err(ApiError::Validation(BID_FORMAT_MESSAGE.into()));
        }
        Ok(bid)
    }
}

// endregion: --- Forms

// region:    --- Response Helpers

/// 변이 성공 후 302 응답
fn redirect_to(path: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, path.to_string())]).into_response()
}

/// 세션 쿠키 생성
fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

// endregion: --- Response Helpers

// region:    --- Auth Handlers

/// 로그인 페이지
pub async fn handle_login_page() -> Response {
    Json(json!({})).into_response()
}

/// 로그인 요청 처리
pub async fn handle_login(
    State(db_manager): State<Arc<DatabaseManager>>,
    jar: CookieJar,
    Json(form): Json<LoginForm>,
) -> Result<Response, ApiError> {
    info!("{:<12} --> 로그인 요청: {}", "Handler", form.username);

    let user = match accounts::find_user_by_username(&db_manager, &form.username).await? {
        Some(user) if accounts::verify_password(&form.password, &user.password_hash) => user,
        // 미존재 사용자와 비밀번호 불일치는 같은 응답
        _ => return Err(ApiError::CredentialMismatch),
    };

    let token = accounts::create_session(&db_manager, user.id).await?;
    let jar = jar.add(session_cookie(token));
    info!("{:<12} --> 로그인 성공: {}", "Handler", user.username);
    Ok((jar, redirect_to("/")).into_response())
}

/// 로그아웃 요청 처리 (미로그인 상태여도 메인으로 돌려보냄)
pub async fn handle_logout(
    State(db_manager): State<Arc<DatabaseManager>>,
    jar: CookieJar,
    auth: Auth,
) -> Result<Response, ApiError> {
    info!("{:<12} --> 로그아웃 요청", "Handler");

    if let Some(token) = auth.token() {
        accounts::revoke_session(&db_manager, token).await?;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, redirect_to("/")).into_response())
}

/// 회원 가입 페이지
pub async fn handle_register_page() -> Response {
    Json(json!({})).into_response()
}

/// 회원 가입 요청 처리
pub async fn handle_register(
    State(db_manager): State<Arc<DatabaseManager>>,
    jar: CookieJar,
    Json(form): Json<RegisterForm>,
) -> Result<Response, ApiError> {
    info!("{:<12} --> 회원 가입 요청: {}", "Handler", form.username);
    form.validate()?;

    let password_hash = accounts::hash_password(&form.password)?;
    let user_id = match accounts::insert_user(
        &db_manager,
        form.username.trim(),
        &form.email,
        &password_hash,
    )
    .await
    {
        Ok(id) => id,
        Err(e) if accounts::is_unique_violation(&e) => return Err(ApiError::UsernameTaken),
        Err(e) => return Err(e.into()),
    };

    // 가입 직후 자동 로그인
    let token = accounts::create_session(&db_manager, user_id).await?;
    let jar = jar.add(session_cookie(token));
    info!("{:<12} --> 회원 가입 완료 id: {}", "Handler", user_id);
    Ok((jar, redirect_to("/")).into_response())
}

// endregion: --- Auth Handlers

// region:    --- Listing Handlers

/// 상품 등록 페이지 (카테고리 선택지 포함)
pub async fn handle_create_page(
    State(db_manager): State<Arc<DatabaseManager>>,
    auth: Auth,
) -> Result<Response, ApiError> {
    auth.require()?;
    let names: Vec<String> = query::handlers::get_categories(&db_manager)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    Ok(Json(json!({ "categories": names })).into_response())
}

/// 상품 등록 요청 처리
pub async fn handle_create(
    State(db_manager): State<Arc<DatabaseManager>>,
    auth: Auth,
    Json(form): Json<NewListingForm>,
) -> Result<Response, ApiError> {
    info!("{:<12} --> 상품 등록 요청: {}", "Handler", form.item);
    let user = auth.require()?;
    let starting_bid = form.validate()?;

    // 카테고리 이름 해석 (빈 값은 미분류)
    let category_id = match form.category.as_deref().filter(|c| !c.is_empty()) {
        Some(name) => Some(
            query::handlers::get_category_id(&db_manager, name)
                .await?
                .ok_or_else(|| {
                    ApiError::Validation(format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        name
                    ))
                })?,
        ),
        None => None,
    };

    let store = PostgresListingStore::new(db_manager.get_pool());
    let listing_id = store
        .create_listing(
            user.id,
            form.item.trim(),
            &form.description,
            starting_bid,
            category_id,
            &form.image_url,
        )
        .await?;
    info!("{:<12} --> 상품 등록 완료 id: {}", "Handler", listing_id);
    Ok(redirect_to("/"))
}

/// 상품 상세 페이지
/// 조회자 파생 플래그 포함 (익명이면 모두 false)
pub async fn handle_listing_page(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(listing_id): Path<i64>,
    auth: Auth,
) -> Result<Response, ApiError> {
    info!("{:<12} --> 상품 상세 페이지 id: {}", "Handler", listing_id);

    let detail = query::handlers::get_listing_detail(&db_manager, listing_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let comments = query::handlers::get_listing_comments(&db_manager, listing_id).await?;

    let (watched, seller, winner) = match auth.user() {
        Some(user) => (
            query::handlers::is_watched(&db_manager, user.id, listing_id).await?,
            user.id == detail.seller_id,
            is_winner(
                Some(user.id),
                detail.seller_id,
                detail.closed,
                detail.current_bidder_id,
            ),
        ),
        None => (false, false, false),
    };
    let closed = detail.closed;

    Ok(Json(json!({
        "listing": detail,
        "comments": comments,
        "watched": watched,
        "seller": seller,
        "closed": closed,
        "winner": winner,
    }))
    .into_response())
}

/// 상품 상세 액션 처리 (종료 / 관심 토글 / 댓글 / 입찰)
pub async fn handle_listing_action(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(listing_id): Path<i64>,
    auth: Auth,
    Json(form): Json<ListingActionForm>,
) -> Result<Response, ApiError> {
    info!(
        "{:<12} --> 상품 액션 요청 id: {} button: {:?}",
        "Handler", listing_id, form.button
    );
    let user = auth.require()?;
    let store = PostgresListingStore::new(db_manager.get_pool());

    match form.button.as_deref() {
        Some("Close") => {
            handle_close_auction(
                CloseAuctionCommand {
                    listing_id,
                    requester_id: user.id,
                },
                &store,
            )
            .await?;
        }
        Some("Watchlist") => {
            // 존재 확인 후 토글 (종료 여부와 무관하게 허용)
            store
                .bid_state(listing_id)
                .await?
                .ok_or(ApiError::NotFound)?;
            store.toggle_watch(user.id, listing_id).await?;
        }
        Some("comment") => {
            let body = form.comment.as_deref().map(str::trim).unwrap_or("");
            if body.is_empty() {
                return Err(ApiError::Validation("This field is required.".into()));
            }
            if body.chars().count() > MAX_COMMENT_LEN {
                return Err(ApiError::Validation(format!(
                    "Ensure this value has at most {} characters.",
                    MAX_COMMENT_LEN
                )));
            }
            store
                .bid_state(listing_id)
                .await?
                .ok_or(ApiError::NotFound)?;
            store.add_comment(listing_id, user.id, body).await?;
        }
        // 그 외 button 값은 전부 입찰 분기
        _ => {
            let amount = form.bid_amount()?;
            handle_place_bid(
                PlaceBidCommand {
                    listing_id,
                    bidder_id: user.id,
                    amount,
                },
                &store,
            )
            .await?;
        }
    }

    Ok(redirect_to(&format!("/listing/{}", listing_id)))
}

// endregion: --- Listing Handlers

// region:    --- Query Handlers

/// 메인 페이지 (전체 상품 목록)
pub async fn handle_index(
    State(db_manager): State<Arc<DatabaseManager>>,
) -> Result<Response, ApiError> {
    info!("{:<12} --> 메인 페이지 조회", "Handler");
    let listings = query::handlers::get_all_listings(&db_manager).await?;
    Ok(Json(json!({ "listings": listings })).into_response())
}

/// 카테고리 목록 페이지
pub async fn handle_categories(
    State(db_manager): State<Arc<DatabaseManager>>,
) -> Result<Response, ApiError> {
    let names: Vec<String> = query::handlers::get_categories(&db_manager)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    Ok(Json(json!({ "categories": names })).into_response())
}

/// 카테고리별 상품 목록 페이지 (미등록 카테고리는 빈 목록)
pub async fn handle_category_listings(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(category): Path<String>,
) -> Result<Response, ApiError> {
    let listings = query::handlers::get_listings_by_category(&db_manager, &category).await?;
    Ok(Json(json!({ "listings": listings })).into_response())
}

/// 관심 목록 페이지
pub async fn handle_watchlist(
    State(db_manager): State<Arc<DatabaseManager>>,
    auth: Auth,
) -> Result<Response, ApiError> {
    let user = auth.require()?;
    let watchlist = query::handlers::get_watched_listings(&db_manager, user.id).await?;
    Ok(Json(json!({ "watchlist": watchlist })).into_response())
}

/// 내 판매 상품 페이지
pub async fn handle_my_listings(
    State(db_manager): State<Arc<DatabaseManager>>,
    auth: Auth,
) -> Result<Response, ApiError> {
    let user = auth.require()?;
    let listings = query::handlers::get_listings_by_seller(&db_manager, user.id).await?;
    Ok(Json(json!({ "listings": listings })).into_response())
}

// endregion: --- Query Handlers
