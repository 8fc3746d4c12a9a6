// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

// endregion: --- Imports

// region:    --- Api Error

/// 요청 경계에서 복구되는 오류 분류 체계
/// BID_TOO_LOW / BID_BELOW_CURRENT는 사용자 메시지가 다르므로 반드시 구분 유지
#[derive(Debug)]
pub enum ApiError {
    /// 필드 검증 실패 (필수값 누락, 범위 초과, 길이 초과 등)
    Validation(String),
    /// 입찰 금액이 시작가 이하
    BidTooLow,
    /// 입찰 금액이 현재 입찰가 이하
    BidBelowCurrent,
    /// 종료된 경매에 대한 입찰
    AuctionClosed,
    /// 판매자 본인 입찰
    SelfBid,
    /// 판매자가 아닌 사용자의 경매 종료 시도
    NotSeller,
    /// 세션 없는 상태의 변경 요청
    Unauthenticated,
    /// 회원가입 시 사용자명 중복
    UsernameTaken,
    /// 로그인 실패 (알 수 없는 사용자/잘못된 비밀번호는 동일 메시지)
    CredentialMismatch,
    /// 상품 없음
    NotFound,
    /// 입찰 CAS 재시도 한도 초과
    MaxRetriesExceeded,
    /// 데이터베이스 오류
    Database(sqlx::Error),
}

impl ApiError {
    /// 상태 코드 / 오류 코드 / 사용자 메시지 변환
    pub fn to_status_and_message(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg.clone()),
            ApiError::BidTooLow => (
                StatusCode::BAD_REQUEST,
                "BID_TOO_LOW",
                "Bid must exceed starting bid and current bid".to_string(),
            ),
            ApiError::BidBelowCurrent => (
                StatusCode::BAD_REQUEST,
                "BID_BELOW_CURRENT",
                "Bid must exceed current".to_string(),
            ),
            ApiError::AuctionClosed => (
                StatusCode::BAD_REQUEST,
                "AUCTION_CLOSED",
                "This auction has closed".to_string(),
            ),
            ApiError::SelfBid => (
                StatusCode::BAD_REQUEST,
                "SELF_BID",
                "The seller may not bid on their own listing".to_string(),
            ),
            ApiError::NotSeller => (
                StatusCode::FORBIDDEN,
                "NOT_SELLER",
                "Only the seller may close this auction".to_string(),
            ),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "You must be logged in".to_string(),
            ),
            ApiError::UsernameTaken => (
                StatusCode::CONFLICT,
                "USERNAME_TAKEN",
                "Username already taken.".to_string(),
            ),
            ApiError::CredentialMismatch => (
                StatusCode::UNAUTHORIZED,
                "CREDENTIAL_MISMATCH",
                "Invalid username and/or password.".to_string(),
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Listing not found".to_string(),
            ),
            ApiError::MaxRetriesExceeded => (
                StatusCode::CONFLICT,
                "MAX_RETRIES_EXCEEDED",
                "Bid could not be applied after repeated conflicts".to_string(),
            ),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB",
                "Internal database error".to_string(),
            ),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Database(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Database(e) = &self {
            error!("{:<12} --> 데이터베이스 오류: {:?}", "Error", e);
        }
        let (status, code, msg) = self.to_status_and_message();
        (
            status,
            Json(serde_json::json!({
                "error": msg,
                "code": code
            })),
        )
            .into_response()
    }
}

// endregion: --- Api Error
