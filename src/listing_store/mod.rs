// region:    --- Imports
use crate::auction::BidState;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Bid Outcome

/// 입찰 기록 시도의 결과
/// Conflict 는 조건부 갱신이 빈손으로 끝난 경우 (동시 입찰 또는 종료 경합)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    Applied { bid_id: i64 },
    Conflict,
}

// endregion: --- Bid Outcome

// region:    --- Listing Store Trait

/// 상품 쓰기 저장소 트레이트
#[async_trait]
pub trait ListingStore {
    /// 입찰 판정용 스냅샷 조회
    async fn bid_state(&self, listing_id: i64) -> Result<Option<BidState>, sqlx::Error>;

    /// 입찰 기록 및 현재 입찰 갱신
    /// expected_current 가 스냅샷 시점의 current_bid_id 와 다르면 Conflict 반환
    async fn append_bid(
        &self,
        listing_id: i64,
        bidder_id: i64,
        amount: Decimal,
        expected_current: Option<i64>,
    ) -> Result<BidOutcome, sqlx::Error>;

    /// 경매 종료 처리
    async fn mark_closed(&self, listing_id: i64) -> Result<(), sqlx::Error>;
}

/// 상품 쓰기 저장소 구현체
pub struct PostgresListingStore {
    pool: Arc<PgPool>,
}

/// 상품 쓰기 저장소 구현체 메서드 구현
#[async_trait]
impl ListingStore for PostgresListingStore {
    async fn bid_state(&self, listing_id: i64) -> Result<Option<BidState>, sqlx::Error> {
        sqlx::query_as::<_, BidState>(
            "SELECT l.id AS listing_id, l.seller_id, l.starting_bid, l.closed,
                    l.current_bid_id, b.amount AS current_amount
            FROM listings l
            LEFT JOIN bids b ON b.id = l.current_bid_id
            WHERE l.id = $1",
        )
        .bind(listing_id)
        .fetch_optional(&*self.pool)
        .await
    }

    async fn append_bid(
        &self,
        listing_id: i64,
        bidder_id: i64,
        amount: Decimal,
        expected_current: Option<i64>,
    ) -> Result<BidOutcome, sqlx::Error> {
        // 트랜잭션 시작
        let mut tx = self.pool.begin().await?;

        // 입찰 기록 추가
        let bid_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO bids (listing_id, bidder_id, amount) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(listing_id)
        .bind(bidder_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        // 현재 입찰 조건부 갱신
        // 스냅샷 이후 다른 입찰이 끼어들었거나 경매가 종료되면 0행
        let updated = sqlx::query(
            "UPDATE listings SET current_bid_id = $1
            WHERE id = $2 AND closed = FALSE AND current_bid_id IS NOT DISTINCT FROM $3",
        )
        .bind(bid_id)
        .bind(listing_id)
        .bind(expected_current)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 1 {
            // 트랜잭션 커밋
            tx.commit().await?;
            info!(
                "{:<12} --> 입찰 반영: listing {} bid {}",
                "ListingStore", listing_id, bid_id
            );
            Ok(BidOutcome::Applied { bid_id })
        } else {
            // 롤백 (입찰 기록도 함께 버림)
            tx.rollback().await?;
            info!(
                "{:<12} --> 입찰 충돌: listing {} 현재 입찰이 변경됨",
                "ListingStore", listing_id
            );
            Ok(BidOutcome::Conflict)
        }
    }

    async fn mark_closed(&self, listing_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE listings SET closed = TRUE WHERE id = $1")
            .bind(listing_id)
            .execute(&*self.pool)
            .await?;
        info!("{:<12} --> 경매 종료: listing {}", "ListingStore", listing_id);
        Ok(())
    }
}

/// 상품 쓰기 저장소 생성 및 부가 쓰기 연산
impl PostgresListingStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 관심 목록 토글, 토글 후 관심 여부를 반환
    pub async fn toggle_watch(&self, user_id: i64, listing_id: i64) -> Result<bool, sqlx::Error> {
        let removed = sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(&*self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO watchlist (user_id, listing_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&*self.pool)
        .await?;
        Ok(true)
    }

    /// 댓글 추가
    pub async fn add_comment(
        &self,
        listing_id: i64,
        author_id: i64,
        body: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO comments (listing_id, author_id, body) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(listing_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(&*self.pool)
        .await
    }

    /// 상품 등록
    pub async fn create_listing(
        &self,
        seller_id: i64,
        item: &str,
        description: &str,
        starting_bid: Decimal,
        category_id: Option<i64>,
        image_url: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO listings (item, description, starting_bid, category_id, image_url, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id",
        )
        .bind(item)
        .bind(description)
        .bind(starting_bid)
        .bind(category_id)
        .bind(image_url)
        .bind(seller_id)
        .fetch_one(&*self.pool)
        .await
    }
}

// endregion: --- Listing Store
