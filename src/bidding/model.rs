use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// 목록 화면용 상품 요약 (현재가/카테고리명/판매자명 조인)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListingSummary {
    pub id: i64,
    pub item: String,
    pub description: String,
    pub starting_bid: Decimal,
    pub current_amount: Option<Decimal>,
    pub category: Option<String>,
    pub image_url: String,
    pub seller: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

// 상세 화면용 상품 (낙찰자 판정에 필요한 참조 포함)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListingDetail {
    pub id: i64,
    pub item: String,
    pub description: String,
    pub starting_bid: Decimal,
    pub current_amount: Option<Decimal>,
    pub current_bidder_id: Option<i64>,
    pub current_bidder: Option<String>,
    pub category: Option<String>,
    pub image_url: String,
    pub seller_id: i64,
    pub seller: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

// 카테고리 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// 댓글 (작성자명 조인)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub listing_id: i64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
